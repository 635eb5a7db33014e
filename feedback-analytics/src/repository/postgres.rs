use crate::error::{FeedbackError, FeedbackResult};
use crate::events::{Compliance, FeedbackEvent, SideEffects};
use crate::repository::{FeedbackFilter, FeedbackRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Postgres-backed feedback log
///
/// The `feedback_events` table carries a unique constraint over
/// `(patient_id, recommendation_id, created_at)`, which is what makes
/// `append` idempotent at the database level.
pub struct PostgresFeedbackRepository {
    pool: PgPool,
}

impl PostgresFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    id: Uuid,
    patient_id: Uuid,
    recommendation_id: Uuid,
    created_at: DateTime<Utc>,
    symptom_improvement: i16,
    side_effect_description: Option<String>,
    side_effect_blocking: Option<bool>,
    compliance: Option<String>,
    free_text: Option<String>,
}

impl From<FeedbackRow> for FeedbackEvent {
    fn from(row: FeedbackRow) -> Self {
        let side_effects = match (row.side_effect_description, row.side_effect_blocking) {
            (Some(description), blocking) => Some(SideEffects {
                description,
                blocking: blocking.unwrap_or(false),
            }),
            _ => None,
        };
        let compliance = row.compliance.as_deref().and_then(|c| match c {
            "full" => Some(Compliance::Full),
            "partial" => Some(Compliance::Partial),
            "none" => Some(Compliance::None),
            _ => None,
        });
        Self {
            id: row.id,
            patient_id: row.patient_id,
            recommendation_id: row.recommendation_id,
            created_at: row.created_at,
            symptom_improvement: row.symptom_improvement as u8,
            side_effects,
            compliance,
            free_text: row.free_text,
        }
    }
}

fn compliance_str(compliance: &Compliance) -> &'static str {
    match compliance {
        Compliance::Full => "full",
        Compliance::Partial => "partial",
        Compliance::None => "none",
    }
}

#[async_trait]
impl FeedbackRepository for PostgresFeedbackRepository {
    async fn append(&self, event: FeedbackEvent) -> FeedbackResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO feedback_events
                (id, patient_id, recommendation_id, created_at,
                 symptom_improvement, side_effect_description,
                 side_effect_blocking, compliance, free_text)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (patient_id, recommendation_id, created_at) DO NOTHING
            "#,
        )
        .bind(event.id)
        .bind(event.patient_id)
        .bind(event.recommendation_id)
        .bind(event.created_at)
        .bind(event.symptom_improvement as i16)
        .bind(event.side_effects.as_ref().map(|s| s.description.clone()))
        .bind(event.side_effects.as_ref().map(|s| s.blocking))
        .bind(event.compliance.as_ref().map(compliance_str))
        .bind(event.free_text.clone())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FeedbackError::DuplicateEvent(event.dedup_key()));
        }
        Ok(())
    }

    async fn query(
        &self,
        filter: &FeedbackFilter,
        since: Option<DateTime<Utc>>,
    ) -> FeedbackResult<Vec<FeedbackEvent>> {
        let rows: Vec<FeedbackRow> = sqlx::query_as(
            r#"
            SELECT id, patient_id, recommendation_id, created_at,
                   symptom_improvement, side_effect_description,
                   side_effect_blocking, compliance, free_text
            FROM feedback_events
            WHERE ($1::uuid IS NULL OR patient_id = $1)
              AND ($2::uuid[] IS NULL OR recommendation_id = ANY($2))
              AND ($3::timestamptz IS NULL OR created_at >= $3)
            ORDER BY created_at ASC
            "#,
        )
        .bind(filter.patient_id)
        .bind(filter.recommendation_ids.as_deref())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedbackEvent::from).collect())
    }

    async fn distinct_recommendations(&self, since: DateTime<Utc>) -> FeedbackResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT recommendation_id
            FROM feedback_events
            WHERE created_at >= $1
            ORDER BY recommendation_id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
