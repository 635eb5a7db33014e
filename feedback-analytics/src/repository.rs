pub mod postgres;

pub use postgres::PostgresFeedbackRepository;

use crate::error::{FeedbackError, FeedbackResult};
use crate::events::FeedbackEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Query filter; `None` fields act as wildcards
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub patient_id: Option<Uuid>,
    pub recommendation_ids: Option<Vec<Uuid>>,
}

impl FeedbackFilter {
    pub fn for_recommendations(ids: Vec<Uuid>) -> Self {
        Self {
            patient_id: None,
            recommendation_ids: Some(ids),
        }
    }

    pub fn matches(&self, event: &FeedbackEvent) -> bool {
        if let Some(patient_id) = self.patient_id {
            if event.patient_id != patient_id {
                return false;
            }
        }
        if let Some(ids) = &self.recommendation_ids {
            if !ids.contains(&event.recommendation_id) {
                return false;
            }
        }
        true
    }
}

/// Repository interface for the append-only feedback log
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Append one event; atomic and durable before returning success.
    /// Appends are linearizable per `recommendation_id`.
    async fn append(&self, event: FeedbackEvent) -> FeedbackResult<()>;

    /// Events matching the filter, created at or after `since`,
    /// oldest first
    async fn query(
        &self,
        filter: &FeedbackFilter,
        since: Option<DateTime<Utc>>,
    ) -> FeedbackResult<Vec<FeedbackEvent>>;

    /// Recommendation ids with at least one event since the given instant
    async fn distinct_recommendations(&self, since: DateTime<Utc>) -> FeedbackResult<Vec<Uuid>>;
}

/// In-memory feedback repository for testing and development
pub struct InMemoryFeedbackRepository {
    events: Arc<DashMap<String, FeedbackEvent>>,
}

impl InMemoryFeedbackRepository {
    pub fn new() -> Self {
        Self {
            events: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryFeedbackRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn append(&self, event: FeedbackEvent) -> FeedbackResult<()> {
        use dashmap::mapref::entry::Entry;

        match self.events.entry(event.dedup_key()) {
            Entry::Occupied(_) => Err(FeedbackError::DuplicateEvent(event.dedup_key())),
            Entry::Vacant(slot) => {
                slot.insert(event);
                Ok(())
            }
        }
    }

    async fn query(
        &self,
        filter: &FeedbackFilter,
        since: Option<DateTime<Utc>>,
    ) -> FeedbackResult<Vec<FeedbackEvent>> {
        let mut events: Vec<FeedbackEvent> = self
            .events
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|event| filter.matches(event))
            .filter(|event| since.map_or(true, |cutoff| event.created_at >= cutoff))
            .collect();
        events.sort_by_key(|event| event.created_at);
        Ok(events)
    }

    async fn distinct_recommendations(&self, since: DateTime<Utc>) -> FeedbackResult<Vec<Uuid>> {
        let mut ids: Vec<Uuid> = self
            .events
            .iter()
            .filter(|entry| entry.value().created_at >= since)
            .map(|entry| entry.value().recommendation_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
