use crate::error::RecommendationResult;
use crate::models::{PatientProfile, PlanEntry, RecommendationDraft, SourceMatch};
use clinical_common::Tradition;
use knowledge_store::KnowledgeStore;
use matching_engine::MatchSet;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Assembles a tradition-grouped treatment plan from top matches
pub struct RecommendationComposer {
    max_per_tradition: usize,
}

impl RecommendationComposer {
    pub fn new() -> Self {
        Self {
            max_per_tradition: 5,
        }
    }

    /// Compose a draft plan for one diagnosis
    ///
    /// Takes up to `max_per_tradition` treatments from each top match,
    /// deduplicates by (tradition, kind, name), keeps provenance on every
    /// entry, and drops anything the patient's profile contraindicates.
    /// An empty match set composes an empty draft, which is still a valid
    /// (if unhelpful) plan.
    pub fn compose(
        &self,
        diagnosis_id: Uuid,
        profile: &PatientProfile,
        match_set: &MatchSet,
        store: &KnowledgeStore,
    ) -> RecommendationResult<RecommendationDraft> {
        let mut draft = RecommendationDraft::new(diagnosis_id, profile.patient_id);
        let mut seen: HashSet<(Tradition, String, String)> = HashSet::new();
        let mut filtered = 0usize;

        for result in match_set.all() {
            draft.source_matches.push(SourceMatch {
                tradition: result.tradition,
                record_id: result.record_id.clone(),
                score: result.score,
            });

            let Ok(treatments) = store.treatments(result.tradition, &result.record_id) else {
                // Matches are computed against the same snapshot, so a miss
                // here means knowledge changed under us; skip, don't fail
                continue;
            };

            for treatment in treatments.iter().take(self.max_per_tradition) {
                let key = (
                    treatment.tradition,
                    format!("{:?}", treatment.kind),
                    treatment.name.to_lowercase(),
                );
                if seen.contains(&key) {
                    continue;
                }
                if profile.flags_treatment(treatment) {
                    filtered += 1;
                    continue;
                }
                seen.insert(key);
                draft.entries.push(PlanEntry {
                    treatment: treatment.clone(),
                    source_record_id: result.record_id.clone(),
                    expected_effectiveness: result.score,
                });
            }
        }

        debug!(
            diagnosis_id = %diagnosis_id,
            entries = draft.entries.len(),
            contraindicated_filtered = filtered,
            "composed recommendation draft"
        );

        Ok(draft)
    }
}

impl Default for RecommendationComposer {
    fn default() -> Self {
        Self::new()
    }
}
