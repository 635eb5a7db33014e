use crate::error::{FeedbackError, FeedbackResult};
use crate::repository::{FeedbackFilter, FeedbackRepository};
use crate::snapshot::{compute_snapshot, EffectivenessSnapshot, Scope};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Scopes derived from one recommendation
#[derive(Debug, Clone, Default)]
pub struct RecommendationScopes {
    /// Knowledge record ids the recommendation was composed from
    pub conditions: Vec<String>,
    /// Herb names contained in the recommendation
    pub herbs: Vec<String>,
}

/// Resolves which recommendations belong to a derived scope
///
/// Implemented by whoever owns the recommendation records; the analyzer
/// never reaches into persistence beyond the feedback log itself.
#[async_trait]
pub trait ScopeIndex: Send + Sync {
    async fn recommendations_for_condition(&self, condition_id: &str) -> Vec<Uuid>;
    async fn recommendations_containing_herb(&self, herb: &str) -> Vec<Uuid>;
    async fn scopes_of_recommendation(&self, recommendation_id: Uuid) -> RecommendationScopes;
}

/// Index for contexts without recommendation records (unit tests, tools)
pub struct NullScopeIndex;

#[async_trait]
impl ScopeIndex for NullScopeIndex {
    async fn recommendations_for_condition(&self, _condition_id: &str) -> Vec<Uuid> {
        Vec::new()
    }
    async fn recommendations_containing_herb(&self, _herb: &str) -> Vec<Uuid> {
        Vec::new()
    }
    async fn scopes_of_recommendation(&self, _recommendation_id: Uuid) -> RecommendationScopes {
        RecommendationScopes::default()
    }
}

/// Analyzer tuning, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Rolling aggregation window
    pub window_days: i64,
    /// Recent partition used by the trend computation
    pub recent_days: i64,
    /// Upper staleness bound for cached snapshots
    pub cache_ttl_s: u64,
    /// Default sample floor for trending queries
    pub min_samples: i64,
    /// Hard cap on trending result size
    pub trending_limit_max: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            recent_days: 30,
            cache_ttl_s: 30,
            min_samples: 5,
            trending_limit_max: 50,
        }
    }
}

struct CachedEntry {
    snapshot: Option<EffectivenessSnapshot>,
    computed_at: Instant,
}

type ScopeKey = (Scope, String);

/// Windowed effectiveness aggregation over the feedback log
///
/// Snapshots are computed on demand, cached for at most `cache_ttl_s`, and
/// invalidated per scope whenever an append touches that scope. A per-scope
/// mutex keeps recomputation single-writer; readers either hit the cache or
/// wait for the in-flight recompute.
pub struct EffectivenessAnalyzer {
    repository: Arc<dyn FeedbackRepository>,
    scope_index: Arc<dyn ScopeIndex>,
    config: AnalyzerConfig,
    cache: DashMap<ScopeKey, CachedEntry>,
    recompute_locks: DashMap<ScopeKey, Arc<Mutex<()>>>,
}

impl EffectivenessAnalyzer {
    pub fn new(
        repository: Arc<dyn FeedbackRepository>,
        scope_index: Arc<dyn ScopeIndex>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            repository,
            scope_index,
            config,
            cache: DashMap::new(),
            recompute_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Effectiveness snapshot for one scope; `None` when the window holds
    /// no events
    pub async fn snapshot(
        &self,
        scope: Scope,
        scope_id: &str,
    ) -> FeedbackResult<Option<EffectivenessSnapshot>> {
        let key = (scope, scope_id.to_string());

        if let Some(entry) = self.cache.get(&key) {
            if entry.computed_at.elapsed().as_secs() < self.config.cache_ttl_s {
                return Ok(entry.snapshot.clone());
            }
        }

        let lock = self
            .recompute_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have recomputed while we waited
        if let Some(entry) = self.cache.get(&key) {
            if entry.computed_at.elapsed().as_secs() < self.config.cache_ttl_s {
                return Ok(entry.snapshot.clone());
            }
        }

        let snapshot = self.recompute(scope, scope_id).await?;
        self.cache.insert(
            key,
            CachedEntry {
                snapshot: snapshot.clone(),
                computed_at: Instant::now(),
            },
        );
        Ok(snapshot)
    }

    /// Drop one cached scope
    pub fn invalidate(&self, scope: Scope, scope_id: &str) {
        self.cache.remove(&(scope, scope_id.to_string()));
    }

    /// Drop every scope an appended event touches: the recommendation
    /// itself plus the condition and herb scopes derived from it
    pub async fn invalidate_for_event(&self, recommendation_id: Uuid) {
        self.invalidate(Scope::Recommendation, &recommendation_id.to_string());

        let scopes = self
            .scope_index
            .scopes_of_recommendation(recommendation_id)
            .await;
        for condition in &scopes.conditions {
            self.invalidate(Scope::Condition, condition);
        }
        for herb in &scopes.herbs {
            self.invalidate(Scope::Herb, herb);
        }
        debug!(
            recommendation_id = %recommendation_id,
            conditions = scopes.conditions.len(),
            herbs = scopes.herbs.len(),
            "invalidated effectiveness scopes"
        );
    }

    /// Sample size from cache only; used for matching tie-breaks where a
    /// possibly stale value is acceptable
    pub fn cached_sample_size(&self, scope: Scope, scope_id: &str) -> Option<i64> {
        self.cache
            .get(&(scope, scope_id.to_string()))
            .and_then(|entry| entry.snapshot.as_ref().map(|s| s.sample_size))
    }

    /// Best-performing recommendation scopes with at least `min_samples`
    /// events behind them
    pub async fn trending(
        &self,
        limit: usize,
        min_samples: Option<i64>,
    ) -> FeedbackResult<Vec<EffectivenessSnapshot>> {
        self.ranked(limit, min_samples, RankOrder::BestFirst).await
    }

    /// Worst-performing dual of `trending`
    pub async fn worst_performing(
        &self,
        limit: usize,
        min_samples: Option<i64>,
    ) -> FeedbackResult<Vec<EffectivenessSnapshot>> {
        self.ranked(limit, min_samples, RankOrder::WorstFirst).await
    }

    async fn ranked(
        &self,
        limit: usize,
        min_samples: Option<i64>,
        order: RankOrder,
    ) -> FeedbackResult<Vec<EffectivenessSnapshot>> {
        let limit = limit.min(self.config.trending_limit_max);
        let min_samples = min_samples.unwrap_or(self.config.min_samples);
        let since = Utc::now() - Duration::days(self.config.window_days);

        let mut snapshots = Vec::new();
        for recommendation_id in self.repository.distinct_recommendations(since).await? {
            match self
                .snapshot(Scope::Recommendation, &recommendation_id.to_string())
                .await
            {
                Ok(Some(snapshot)) if snapshot.sample_size >= min_samples => {
                    snapshots.push(snapshot)
                }
                Ok(_) => {}
                Err(err) => {
                    // One failed scope must not sink the whole ranking
                    warn!(recommendation_id = %recommendation_id, error = %err, "skipping scope in ranking");
                }
            }
        }

        snapshots.sort_by(|a, b| {
            let primary = match order {
                RankOrder::BestFirst => b.score.partial_cmp(&a.score),
                RankOrder::WorstFirst => a.score.partial_cmp(&b.score),
            };
            primary
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal))
                .then_with(|| b.sample_size.cmp(&a.sample_size))
                .then_with(|| a.scope_id.cmp(&b.scope_id))
        });
        snapshots.truncate(limit);
        Ok(snapshots)
    }

    async fn recompute(
        &self,
        scope: Scope,
        scope_id: &str,
    ) -> FeedbackResult<Option<EffectivenessSnapshot>> {
        let recommendation_ids = match scope {
            Scope::Recommendation => {
                let id = Uuid::parse_str(scope_id).map_err(|_| {
                    FeedbackError::InvalidScope(format!("not a recommendation id: {scope_id}"))
                })?;
                vec![id]
            }
            Scope::Condition => {
                self.scope_index
                    .recommendations_for_condition(scope_id)
                    .await
            }
            Scope::Herb => {
                self.scope_index
                    .recommendations_containing_herb(scope_id)
                    .await
            }
        };

        if recommendation_ids.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let since = now - Duration::days(self.config.window_days);
        let events = self
            .repository
            .query(
                &FeedbackFilter::for_recommendations(recommendation_ids),
                Some(since),
            )
            .await?;

        Ok(compute_snapshot(
            scope,
            scope_id,
            self.config.window_days,
            self.config.recent_days,
            now,
            &events,
        ))
    }
}

#[derive(Clone, Copy)]
enum RankOrder {
    BestFirst,
    WorstFirst,
}
