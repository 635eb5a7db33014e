use crate::models::{PatientProfile, RecommendationDraft};
use crate::similarity::cosine;
use async_trait::async_trait;
use std::cmp::Ordering;
use tracing::debug;
use uuid::Uuid;

/// Effectiveness metrics seam; implemented over the analytics layer
#[async_trait]
pub trait EffectivenessSource: Send + Sync {
    /// (score, confidence) for a recommendation, when any feedback exists
    async fn effectiveness(&self, recommendation_id: Uuid) -> Option<(f64, f64)>;
}

/// Prior patient outcomes seam; implemented over persistence
#[async_trait]
pub trait OutcomeArchive: Send + Sync {
    /// Profiles of patients who received this recommendation, with whether
    /// it worked for them
    async fn outcomes(&self, recommendation_id: Uuid) -> Vec<(PatientProfile, bool)>;
}

/// Source for contexts without history
pub struct NoHistory;

#[async_trait]
impl EffectivenessSource for NoHistory {
    async fn effectiveness(&self, _recommendation_id: Uuid) -> Option<(f64, f64)> {
        None
    }
}

#[async_trait]
impl OutcomeArchive for NoHistory {
    async fn outcomes(&self, _recommendation_id: Uuid) -> Vec<(PatientProfile, bool)> {
        Vec::new()
    }
}

/// Composite weights: prior, effectiveness, similarity, contraindication
#[derive(Debug, Clone, Copy)]
pub struct RankWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.4,
            gamma: 0.2,
            delta: 1.0,
        }
    }
}

/// Neutral defaults when a candidate has no feedback or outcome history
const NEUTRAL_EFFECTIVENESS: (f64, f64) = (0.5, 0.5);
const NEUTRAL_SIMILARITY: f64 = 0.5;

/// Number of most-similar prior patients consulted per candidate
const SIMILAR_PATIENTS_K: usize = 10;

/// A candidate plan with its matching prior
#[derive(Debug, Clone)]
pub struct RankCandidate {
    pub draft: RecommendationDraft,
    /// MatchingEngine-normalized score backing this plan
    pub prior: f64,
}

/// One ranked plan with its score decomposition
#[derive(Debug, Clone)]
pub struct RankedRecommendation {
    pub draft: RecommendationDraft,
    pub composite: f64,
    pub prior: f64,
    pub effectiveness_score: f64,
    pub effectiveness_confidence: f64,
    pub similarity_score: f64,
}

/// Patient-aware candidate ranking
pub struct PredictionRanker {
    weights: RankWeights,
}

impl PredictionRanker {
    pub fn new() -> Self {
        Self {
            weights: RankWeights::default(),
        }
    }

    pub fn with_weights(weights: RankWeights) -> Self {
        Self { weights }
    }

    /// Order candidates for one patient
    ///
    /// composite = alpha * prior
    ///           + beta * effectiveness_score * effectiveness_confidence
    ///           + gamma * similarity_score
    ///
    /// Contraindicated candidates are removed before scoring; the delta
    /// penalty exists so partial flags could demote instead, but the output
    /// contract filters them outright. Each surviving draft's version is
    /// bumped. Ordering is strictly total: ties break on recommendation id.
    pub async fn rank(
        &self,
        profile: &PatientProfile,
        candidates: Vec<RankCandidate>,
        effectiveness: &dyn EffectivenessSource,
        archive: &dyn OutcomeArchive,
    ) -> Vec<RankedRecommendation> {
        let mut ranked = Vec::new();

        for candidate in candidates {
            if candidate
                .draft
                .entries
                .iter()
                .any(|entry| profile.flags_treatment(&entry.treatment))
            {
                debug!(
                    recommendation_id = %candidate.draft.id,
                    "candidate filtered: contraindicated for patient"
                );
                continue;
            }

            let (eff_score, eff_confidence) = effectiveness
                .effectiveness(candidate.draft.id)
                .await
                .unwrap_or(NEUTRAL_EFFECTIVENESS);

            let similarity = self
                .similarity_score(profile, candidate.draft.id, archive)
                .await;

            let composite = self.weights.alpha * candidate.prior
                + self.weights.beta * eff_score * eff_confidence
                + self.weights.gamma * similarity;

            let mut draft = candidate.draft;
            draft.bump_version();

            ranked.push(RankedRecommendation {
                draft,
                composite,
                prior: candidate.prior,
                effectiveness_score: eff_score,
                effectiveness_confidence: eff_confidence,
                similarity_score: similarity,
            });
        }

        ranked.sort_by(|a, b| {
            b.composite
                .partial_cmp(&a.composite)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.draft.id.cmp(&b.draft.id))
        });
        ranked
    }

    /// Mean success rate of this recommendation over the k most similar
    /// prior patients; neutral when there is no history
    async fn similarity_score(
        &self,
        profile: &PatientProfile,
        recommendation_id: Uuid,
        archive: &dyn OutcomeArchive,
    ) -> f64 {
        let outcomes = archive.outcomes(recommendation_id).await;
        if outcomes.is_empty() {
            return NEUTRAL_SIMILARITY;
        }

        let target = profile.feature_vector();
        let mut scored: Vec<(f64, bool)> = outcomes
            .iter()
            .map(|(other, success)| (cosine(&target, &other.feature_vector()), *success))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(SIMILAR_PATIENTS_K);

        let successes = scored.iter().filter(|(_, success)| *success).count();
        successes as f64 / scored.len() as f64
    }
}

impl Default for PredictionRanker {
    fn default() -> Self {
        Self::new()
    }
}
