pub mod postgres;

use crate::error::CoordinatorResult;
use crate::models::Diagnosis;
use async_trait::async_trait;
use dashmap::DashMap;
use recommendation_service::{PatientProfile, RecommendationDraft};
use std::sync::Arc;
use uuid::Uuid;

/// Upsert-by-id store for diagnoses
#[async_trait]
pub trait DiagnosisRepository: Send + Sync {
    async fn upsert(&self, diagnosis: &Diagnosis) -> CoordinatorResult<()>;
    async fn get(&self, id: Uuid) -> CoordinatorResult<Option<Diagnosis>>;
}

/// Upsert-by-id store for recommendation drafts
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn upsert(&self, draft: &RecommendationDraft) -> CoordinatorResult<()>;
    async fn get(&self, id: Uuid) -> CoordinatorResult<Option<RecommendationDraft>>;
    async fn for_diagnosis(&self, diagnosis_id: Uuid)
        -> CoordinatorResult<Option<RecommendationDraft>>;
    async fn active_for_patient(&self, patient_id: Uuid)
        -> CoordinatorResult<Vec<RecommendationDraft>>;
    /// Recommendations composed from the given knowledge record
    async fn referencing_condition(&self, condition_id: &str) -> CoordinatorResult<Vec<Uuid>>;
    /// Recommendations whose plan contains the given herb
    async fn containing_herb(&self, herb: &str) -> CoordinatorResult<Vec<Uuid>>;
}

/// Read access to patient profiles
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn profile(&self, patient_id: Uuid) -> CoordinatorResult<Option<PatientProfile>>;
    async fn upsert_profile(&self, profile: &PatientProfile) -> CoordinatorResult<()>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATIONS
// ============================================================================

/// In-memory diagnosis store for testing and development
pub struct InMemoryDiagnosisRepository {
    diagnoses: Arc<DashMap<Uuid, Diagnosis>>,
}

impl InMemoryDiagnosisRepository {
    pub fn new() -> Self {
        Self {
            diagnoses: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryDiagnosisRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiagnosisRepository for InMemoryDiagnosisRepository {
    async fn upsert(&self, diagnosis: &Diagnosis) -> CoordinatorResult<()> {
        self.diagnoses.insert(diagnosis.id, diagnosis.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoordinatorResult<Option<Diagnosis>> {
        Ok(self.diagnoses.get(&id).map(|d| d.clone()))
    }
}

/// In-memory recommendation store for testing and development
pub struct InMemoryRecommendationRepository {
    drafts: Arc<DashMap<Uuid, RecommendationDraft>>,
}

impl InMemoryRecommendationRepository {
    pub fn new() -> Self {
        Self {
            drafts: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRecommendationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecommendationRepository for InMemoryRecommendationRepository {
    async fn upsert(&self, draft: &RecommendationDraft) -> CoordinatorResult<()> {
        self.drafts.insert(draft.id, draft.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoordinatorResult<Option<RecommendationDraft>> {
        Ok(self.drafts.get(&id).map(|d| d.clone()))
    }

    async fn for_diagnosis(
        &self,
        diagnosis_id: Uuid,
    ) -> CoordinatorResult<Option<RecommendationDraft>> {
        Ok(self
            .drafts
            .iter()
            .find(|entry| entry.value().diagnosis_id == diagnosis_id)
            .map(|entry| entry.value().clone()))
    }

    async fn active_for_patient(
        &self,
        patient_id: Uuid,
    ) -> CoordinatorResult<Vec<RecommendationDraft>> {
        let mut drafts: Vec<RecommendationDraft> = self
            .drafts
            .iter()
            .filter(|entry| entry.value().patient_id == patient_id)
            .map(|entry| entry.value().clone())
            .collect();
        drafts.sort_by_key(|d| d.id);
        Ok(drafts)
    }

    async fn referencing_condition(&self, condition_id: &str) -> CoordinatorResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .drafts
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .source_matches
                    .iter()
                    .any(|m| m.record_id == condition_id)
            })
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn containing_herb(&self, herb: &str) -> CoordinatorResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .drafts
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .herbs()
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(herb))
            })
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// In-memory patient store for testing and development
pub struct InMemoryPatientRepository {
    profiles: Arc<DashMap<Uuid, PatientProfile>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryPatientRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn profile(&self, patient_id: Uuid) -> CoordinatorResult<Option<PatientProfile>> {
        Ok(self.profiles.get(&patient_id).map(|p| p.clone()))
    }

    async fn upsert_profile(&self, profile: &PatientProfile) -> CoordinatorResult<()> {
        self.profiles.insert(profile.patient_id, profile.clone());
        Ok(())
    }
}
