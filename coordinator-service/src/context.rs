use crate::config::TibbConfig;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::pool::ScoringPool;
use crate::repository::{
    DiagnosisRepository, InMemoryDiagnosisRepository, InMemoryPatientRepository,
    InMemoryRecommendationRepository, PatientRepository, RecommendationRepository,
};
use async_trait::async_trait;
use broadcast_fabric::BroadcastFabric;
use clinical_common::Tradition;
use feedback_analytics::{
    EffectivenessAnalyzer, FeedbackFilter, FeedbackRepository, InMemoryFeedbackRepository,
    RecommendationScopes, Scope, ScopeIndex,
};
use knowledge_store::KnowledgeStore;
use matching_engine::{MatchingEngine, SampleSizeLookup};
use recommendation_service::{
    EffectivenessSource, OutcomeArchive, PatientProfile, PredictionRanker,
    RecommendationComposer,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use vision_analysis::FeatureExtractor;

/// Explicit dependency bundle for the coordinator
///
/// Everything the flows touch is injected here once at startup; there are
/// no module-level singletons anywhere in the engine.
#[derive(Clone)]
pub struct Context {
    pub config: TibbConfig,
    pub knowledge: Arc<KnowledgeStore>,
    pub extractor: Arc<FeatureExtractor>,
    pub engine: Arc<MatchingEngine>,
    pub composer: Arc<RecommendationComposer>,
    pub ranker: Arc<PredictionRanker>,
    pub analyzer: Arc<EffectivenessAnalyzer>,
    pub fabric: Arc<BroadcastFabric>,
    pub diagnoses: Arc<dyn DiagnosisRepository>,
    pub recommendations: Arc<dyn RecommendationRepository>,
    pub patients: Arc<dyn PatientRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub scoring_pool: Arc<ScoringPool>,
}

impl Context {
    /// Fully in-memory context for development and tests
    pub fn in_memory(knowledge: KnowledgeStore, config: TibbConfig) -> CoordinatorResult<Self> {
        let knowledge = Arc::new(knowledge);
        let feedback: Arc<dyn FeedbackRepository> = Arc::new(InMemoryFeedbackRepository::new());
        let recommendations: Arc<dyn RecommendationRepository> =
            Arc::new(InMemoryRecommendationRepository::new());
        let patients: Arc<dyn PatientRepository> = Arc::new(InMemoryPatientRepository::new());
        let diagnoses: Arc<dyn DiagnosisRepository> = Arc::new(InMemoryDiagnosisRepository::new());

        let scope_index = Arc::new(RepoScopeIndex {
            recommendations: recommendations.clone(),
        });
        let analyzer = Arc::new(EffectivenessAnalyzer::new(
            feedback.clone(),
            scope_index,
            config.analyzer_config(),
        ));

        let extractor = Arc::new(
            FeatureExtractor::new(config.vision_config())
                .map_err(|e| CoordinatorError::Config(e.to_string()))?,
        );

        Ok(Self {
            fabric: Arc::new(BroadcastFabric::new(config.broadcast_config())),
            scoring_pool: Arc::new(ScoringPool::new(config.worker_pool_size)),
            engine: Arc::new(MatchingEngine::new()),
            composer: Arc::new(RecommendationComposer::new()),
            ranker: Arc::new(PredictionRanker::new()),
            config,
            knowledge,
            extractor,
            analyzer,
            diagnoses,
            recommendations,
            patients,
            feedback,
        })
    }

    /// Context over the Postgres repositories named by `database_url`
    pub async fn with_postgres(
        knowledge: KnowledgeStore,
        config: TibbConfig,
    ) -> CoordinatorResult<Self> {
        use crate::repository::postgres::{
            PostgresDiagnosisRepository, PostgresPatientRepository,
            PostgresRecommendationRepository,
        };
        use database_layer::{DatabasePool, PoolConfig};
        use feedback_analytics::PostgresFeedbackRepository;

        let url = config
            .database_url
            .clone()
            .ok_or_else(|| CoordinatorError::Config("database_url is required".to_string()))?;
        let pool = DatabasePool::new(&url, PoolConfig::default())
            .await
            .map_err(|e| CoordinatorError::Config(e.to_string()))?;

        let knowledge = Arc::new(knowledge);
        let feedback: Arc<dyn FeedbackRepository> =
            Arc::new(PostgresFeedbackRepository::new(pool.pool().clone()));
        let recommendations: Arc<dyn RecommendationRepository> =
            Arc::new(PostgresRecommendationRepository::new(pool.pool().clone()));
        let patients: Arc<dyn PatientRepository> =
            Arc::new(PostgresPatientRepository::new(pool.pool().clone()));
        let diagnoses: Arc<dyn DiagnosisRepository> =
            Arc::new(PostgresDiagnosisRepository::new(pool.pool().clone()));

        let scope_index = Arc::new(RepoScopeIndex {
            recommendations: recommendations.clone(),
        });
        let analyzer = Arc::new(EffectivenessAnalyzer::new(
            feedback.clone(),
            scope_index,
            config.analyzer_config(),
        ));

        let extractor = Arc::new(
            FeatureExtractor::new(config.vision_config())
                .map_err(|e| CoordinatorError::Config(e.to_string()))?,
        );

        Ok(Self {
            fabric: Arc::new(BroadcastFabric::new(config.broadcast_config())),
            scoring_pool: Arc::new(ScoringPool::new(config.worker_pool_size)),
            engine: Arc::new(MatchingEngine::new()),
            composer: Arc::new(RecommendationComposer::new()),
            ranker: Arc::new(PredictionRanker::new()),
            config,
            knowledge,
            extractor,
            analyzer,
            diagnoses,
            recommendations,
            patients,
            feedback,
        })
    }

    /// Swap the feature extractor (test doubles, custom providers)
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }
}

// ============================================================================
// SEAM ADAPTERS
// ============================================================================

/// Scope index over the recommendation repository
pub struct RepoScopeIndex {
    pub recommendations: Arc<dyn RecommendationRepository>,
}

#[async_trait]
impl ScopeIndex for RepoScopeIndex {
    async fn recommendations_for_condition(&self, condition_id: &str) -> Vec<Uuid> {
        self.recommendations
            .referencing_condition(condition_id)
            .await
            .unwrap_or_else(|err| {
                warn!(condition_id = condition_id, error = %err, "condition scope lookup failed");
                Vec::new()
            })
    }

    async fn recommendations_containing_herb(&self, herb: &str) -> Vec<Uuid> {
        self.recommendations
            .containing_herb(herb)
            .await
            .unwrap_or_else(|err| {
                warn!(herb = herb, error = %err, "herb scope lookup failed");
                Vec::new()
            })
    }

    async fn scopes_of_recommendation(&self, recommendation_id: Uuid) -> RecommendationScopes {
        match self.recommendations.get(recommendation_id).await {
            Ok(Some(draft)) => RecommendationScopes {
                conditions: draft
                    .condition_ids()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                herbs: draft.herbs().into_iter().map(str::to_string).collect(),
            },
            _ => RecommendationScopes::default(),
        }
    }
}

/// Effectiveness metrics for the ranker, backed by the analyzer
pub struct AnalyzerEffectiveness(pub Arc<EffectivenessAnalyzer>);

#[async_trait]
impl EffectivenessSource for AnalyzerEffectiveness {
    async fn effectiveness(&self, recommendation_id: Uuid) -> Option<(f64, f64)> {
        match self
            .0
            .snapshot(Scope::Recommendation, &recommendation_id.to_string())
            .await
        {
            Ok(Some(snapshot)) => Some((snapshot.score, snapshot.confidence)),
            Ok(None) => None,
            Err(err) => {
                warn!(recommendation_id = %recommendation_id, error = %err, "effectiveness lookup failed");
                None
            }
        }
    }
}

/// Tie-break sample sizes for the matching engine, read from the analyzer
/// cache only; matching never blocks on a recompute
pub struct AnalyzerSampleSizes(pub Arc<EffectivenessAnalyzer>);

impl SampleSizeLookup for AnalyzerSampleSizes {
    fn sample_size(&self, _tradition: Tradition, record_id: &str) -> Option<i64> {
        self.0.cached_sample_size(Scope::Condition, record_id)
    }
}

/// Prior patient outcomes assembled from the feedback log and profiles
pub struct FeedbackOutcomeArchive {
    pub feedback: Arc<dyn FeedbackRepository>,
    pub patients: Arc<dyn PatientRepository>,
}

#[async_trait]
impl OutcomeArchive for FeedbackOutcomeArchive {
    async fn outcomes(&self, recommendation_id: Uuid) -> Vec<(PatientProfile, bool)> {
        let events = match self
            .feedback
            .query(
                &FeedbackFilter::for_recommendations(vec![recommendation_id]),
                None,
            )
            .await
        {
            Ok(events) => events,
            Err(err) => {
                warn!(recommendation_id = %recommendation_id, error = %err, "outcome query failed");
                return Vec::new();
            }
        };

        // Latest event per patient decides the outcome; query is oldest-first
        let mut latest: HashMap<Uuid, bool> = HashMap::new();
        for event in events {
            latest.insert(event.patient_id, event.is_successful());
        }

        let mut outcomes = Vec::new();
        for (patient_id, successful) in latest {
            if let Ok(Some(profile)) = self.patients.profile(patient_id).await {
                outcomes.push((profile, successful));
            }
        }
        outcomes
    }
}
