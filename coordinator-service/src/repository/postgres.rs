use crate::error::CoordinatorResult;
use crate::models::Diagnosis;
use crate::repository::{DiagnosisRepository, PatientRepository, RecommendationRepository};
use async_trait::async_trait;
use recommendation_service::{PatientProfile, RecommendationDraft};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres diagnosis store
///
/// Documents are upserted by id as JSONB payloads; the relational columns
/// exist for indexing, the payload is the source of truth.
pub struct PostgresDiagnosisRepository {
    pool: PgPool,
}

impl PostgresDiagnosisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiagnosisRepository for PostgresDiagnosisRepository {
    async fn upsert(&self, diagnosis: &Diagnosis) -> CoordinatorResult<()> {
        sqlx::query(
            r#"
            INSERT INTO diagnoses (id, patient_id, payload, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET payload = EXCLUDED.payload
            "#,
        )
        .bind(diagnosis.id)
        .bind(diagnosis.patient_id)
        .bind(serde_json::to_value(diagnosis)?)
        .bind(diagnosis.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoordinatorResult<Option<Diagnosis>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM diagnoses WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((payload,)) => Ok(Some(serde_json::from_value(payload)?)),
            None => Ok(None),
        }
    }
}

/// Postgres recommendation store
pub struct PostgresRecommendationRepository {
    pool: PgPool,
}

impl PostgresRecommendationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationRepository for PostgresRecommendationRepository {
    async fn upsert(&self, draft: &RecommendationDraft) -> CoordinatorResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendations (id, diagnosis_id, patient_id, version, payload, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
                SET version = EXCLUDED.version,
                    payload = EXCLUDED.payload,
                    updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(draft.id)
        .bind(draft.diagnosis_id)
        .bind(draft.patient_id)
        .bind(draft.version as i32)
        .bind(serde_json::to_value(draft)?)
        .bind(draft.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoordinatorResult<Option<RecommendationDraft>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM recommendations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((payload,)) => Ok(Some(serde_json::from_value(payload)?)),
            None => Ok(None),
        }
    }

    async fn for_diagnosis(
        &self,
        diagnosis_id: Uuid,
    ) -> CoordinatorResult<Option<RecommendationDraft>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT payload FROM recommendations WHERE diagnosis_id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(diagnosis_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some((payload,)) => Ok(Some(serde_json::from_value(payload)?)),
            None => Ok(None),
        }
    }

    async fn active_for_patient(
        &self,
        patient_id: Uuid,
    ) -> CoordinatorResult<Vec<RecommendationDraft>> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT payload FROM recommendations WHERE patient_id = $1 ORDER BY id ASC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(payload,)| serde_json::from_value(payload).map_err(Into::into))
            .collect()
    }

    async fn referencing_condition(&self, condition_id: &str) -> CoordinatorResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM recommendations
            WHERE payload->'source_matches' @> $1
            ORDER BY id ASC
            "#,
        )
        .bind(json!([{ "record_id": condition_id }]))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn containing_herb(&self, herb: &str) -> CoordinatorResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM recommendations
            WHERE payload->'entries' @> $1
            ORDER BY id ASC
            "#,
        )
        .bind(json!([{ "treatment": { "kind": "herb", "name": herb } }]))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

/// Postgres patient profile store
pub struct PostgresPatientRepository {
    pool: PgPool,
}

impl PostgresPatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientRepository for PostgresPatientRepository {
    async fn profile(&self, patient_id: Uuid) -> CoordinatorResult<Option<PatientProfile>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM patient_profiles WHERE patient_id = $1")
                .bind(patient_id)
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((payload,)) => Ok(Some(serde_json::from_value(payload)?)),
            None => Ok(None),
        }
    }

    async fn upsert_profile(&self, profile: &PatientProfile) -> CoordinatorResult<()> {
        sqlx::query(
            r#"
            INSERT INTO patient_profiles (patient_id, payload)
            VALUES ($1, $2)
            ON CONFLICT (patient_id) DO UPDATE SET payload = EXCLUDED.payload
            "#,
        )
        .bind(profile.patient_id)
        .bind(serde_json::to_value(profile)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
