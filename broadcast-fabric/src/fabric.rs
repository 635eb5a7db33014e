use crate::events::UpdateEvent;
use crate::inbox::{Inbox, Subscription};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fabric tuning, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Replay buffer length per diagnosis
    pub replay_queue_size: usize,
    /// Replay entry lifetime
    pub replay_ttl_hours: i64,
    /// Subscriber inbox capacity
    pub inbox_capacity: usize,
    /// Transport drain deadline per subscriber
    pub subscriber_send_timeout_s: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            replay_queue_size: 100,
            replay_ttl_hours: 24,
            inbox_capacity: 64,
            subscriber_send_timeout_s: 5,
        }
    }
}

struct ReplayEntry {
    event: UpdateEvent,
    queued_at: DateTime<Utc>,
}

struct SubscriberHandle {
    subscriber_id: Uuid,
    inbox: Arc<Inbox>,
}

#[derive(Default)]
struct Topic {
    subscribers: Vec<SubscriberHandle>,
    replay: VecDeque<ReplayEntry>,
}

/// Per-diagnosis topic bus with offline replay
///
/// The topic table lock is held only for roster edits and replay appends;
/// fan-out iterates a snapshot of the roster without holding any lock
/// during inbox pushes.
pub struct BroadcastFabric {
    topics: RwLock<HashMap<Uuid, Arc<Mutex<Topic>>>>,
    config: BroadcastConfig,
}

impl BroadcastFabric {
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &BroadcastConfig {
        &self.config
    }

    /// Subscribe to a diagnosis topic
    ///
    /// The new inbox receives a connect marker, then every live (unexpired)
    /// replay event in publication order, then live events. The replay
    /// queue is cleared by this first flush; a later subscriber starts from
    /// live events only.
    pub async fn subscribe(&self, diagnosis_id: Uuid, subscriber_id: Uuid) -> Subscription {
        let topic = self.topic(diagnosis_id).await;
        let inbox = Arc::new(Inbox::new(self.config.inbox_capacity));

        let mut guard = topic.lock().await;

        let _ = inbox.push(UpdateEvent::connect(diagnosis_id, subscriber_id));

        let cutoff = Utc::now() - ChronoDuration::hours(self.config.replay_ttl_hours);
        let mut replayed = 0usize;
        for entry in guard.replay.drain(..) {
            if entry.queued_at >= cutoff {
                let _ = inbox.push(entry.event);
                replayed += 1;
            }
        }

        guard.subscribers.push(SubscriberHandle {
            subscriber_id,
            inbox: inbox.clone(),
        });

        info!(
            diagnosis_id = %diagnosis_id,
            subscriber_id = %subscriber_id,
            replayed = replayed,
            subscribers = guard.subscribers.len(),
            "subscriber joined"
        );

        Subscription {
            diagnosis_id,
            subscriber_id,
            inbox,
        }
    }

    /// Remove a subscriber and drop its undelivered events
    pub async fn unsubscribe(&self, subscription: &Subscription) {
        let topic = self.topic(subscription.diagnosis_id).await;
        let mut guard = topic.lock().await;
        guard
            .subscribers
            .retain(|handle| handle.subscriber_id != subscription.subscriber_id);
        subscription.inbox.close();

        debug!(
            diagnosis_id = %subscription.diagnosis_id,
            subscriber_id = %subscription.subscriber_id,
            "subscriber left"
        );
    }

    /// Fan an event out to the topic's current subscribers, or queue it for
    /// replay when nobody is connected. Returns the number of inboxes that
    /// accepted the event.
    pub async fn publish(&self, diagnosis_id: Uuid, event: UpdateEvent) -> usize {
        let topic = self.topic(diagnosis_id).await;

        // Roster snapshot under the topic lock; deliveries happen outside it
        let roster: Vec<(Uuid, Arc<Inbox>)> = {
            let mut guard = topic.lock().await;

            if guard.subscribers.is_empty() {
                let cutoff = Utc::now() - ChronoDuration::hours(self.config.replay_ttl_hours);
                guard.replay.retain(|entry| entry.queued_at >= cutoff);
                if guard.replay.len() == self.config.replay_queue_size {
                    guard.replay.pop_front();
                }
                guard.replay.push_back(ReplayEntry {
                    event,
                    queued_at: Utc::now(),
                });
                return 0;
            }

            guard
                .subscribers
                .iter()
                .map(|handle| (handle.subscriber_id, handle.inbox.clone()))
                .collect()
        };

        let mut delivered = 0usize;
        let mut dead: Vec<Uuid> = Vec::new();
        for (subscriber_id, inbox) in roster {
            match inbox.push(event.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    // Recovered locally: the failing subscriber is dropped,
                    // everyone else is unaffected
                    warn!(
                        diagnosis_id = %diagnosis_id,
                        subscriber_id = %subscriber_id,
                        error = %err,
                        "delivery failed; disconnecting subscriber"
                    );
                    dead.push(subscriber_id);
                }
            }
        }

        if !dead.is_empty() {
            let mut guard = topic.lock().await;
            guard
                .subscribers
                .retain(|handle| !dead.contains(&handle.subscriber_id));
        }

        delivered
    }

    /// Current subscriber count for a diagnosis
    pub async fn subscriber_count(&self, diagnosis_id: Uuid) -> usize {
        let topics = self.topics.read().await;
        match topics.get(&diagnosis_id) {
            Some(topic) => topic.lock().await.subscribers.len(),
            None => 0,
        }
    }

    /// Queued replay events for a diagnosis
    pub async fn replay_len(&self, diagnosis_id: Uuid) -> usize {
        let topics = self.topics.read().await;
        match topics.get(&diagnosis_id) {
            Some(topic) => topic.lock().await.replay.len(),
            None => 0,
        }
    }

    async fn topic(&self, diagnosis_id: Uuid) -> Arc<Mutex<Topic>> {
        {
            let topics = self.topics.read().await;
            if let Some(topic) = topics.get(&diagnosis_id) {
                return topic.clone();
            }
        }
        let mut topics = self.topics.write().await;
        topics
            .entry(diagnosis_id)
            .or_insert_with(|| Arc::new(Mutex::new(Topic::default())))
            .clone()
    }
}

impl Default for BroadcastFabric {
    fn default() -> Self {
        Self::new(BroadcastConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn numbered_event(diagnosis_id: Uuid, n: u8) -> UpdateEvent {
        UpdateEvent::feedback_update(diagnosis_id, Uuid::new_v4(), n, None)
    }

    async fn drain_live(subscription: &Subscription, count: usize) -> Vec<UpdateEvent> {
        let mut events = Vec::new();
        while events.len() < count {
            let event = subscription.recv().await.expect("stream ended early");
            if event.kind != EventKind::Connect {
                events.push(event);
            }
        }
        events
    }

    #[tokio::test]
    async fn all_subscribers_see_publications_in_order() {
        let fabric = BroadcastFabric::default();
        let diagnosis = Uuid::new_v4();

        let subs = vec![
            fabric.subscribe(diagnosis, Uuid::new_v4()).await,
            fabric.subscribe(diagnosis, Uuid::new_v4()).await,
            fabric.subscribe(diagnosis, Uuid::new_v4()).await,
        ];

        for n in 1..=3 {
            let delivered = fabric.publish(diagnosis, numbered_event(diagnosis, n)).await;
            assert_eq!(delivered, 3);
        }

        for sub in &subs {
            let events = drain_live(sub, 3).await;
            let ratings: Vec<u64> = events
                .iter()
                .map(|e| e.data["rating"].as_u64().unwrap())
                .collect();
            assert_eq!(ratings, vec![1, 2, 3]);
        }
    }

    #[tokio::test]
    async fn offline_publishes_replay_to_first_subscriber_only() {
        let fabric = BroadcastFabric::new(BroadcastConfig {
            replay_queue_size: 100,
            inbox_capacity: 128,
            ..Default::default()
        });
        let diagnosis = Uuid::new_v4();

        for n in 0..150 {
            fabric
                .publish(diagnosis, numbered_event(diagnosis, (n % 5) as u8 + 1))
                .await;
        }
        assert_eq!(fabric.replay_len(diagnosis).await, 100);

        let first = fabric.subscribe(diagnosis, Uuid::new_v4()).await;
        // Connect marker plus exactly the retained 100
        let replayed = drain_live(&first, 100).await;
        assert_eq!(replayed.len(), 100);
        assert_eq!(fabric.replay_len(diagnosis).await, 0);

        // A second subscriber gets live events only
        let second = fabric.subscribe(diagnosis, Uuid::new_v4()).await;
        fabric.publish(diagnosis, numbered_event(diagnosis, 5)).await;
        let live = drain_live(&second, 1).await;
        assert_eq!(live.len(), 1);
        assert!(second.inbox.is_empty());
    }

    #[tokio::test]
    async fn replay_capacity_evicts_oldest() {
        let fabric = BroadcastFabric::new(BroadcastConfig {
            replay_queue_size: 3,
            ..Default::default()
        });
        let diagnosis = Uuid::new_v4();

        for n in 1..=5 {
            fabric.publish(diagnosis, numbered_event(diagnosis, n)).await;
        }
        assert_eq!(fabric.replay_len(diagnosis).await, 3);

        let sub = fabric.subscribe(diagnosis, Uuid::new_v4()).await;
        let events = drain_live(&sub, 3).await;
        let ratings: Vec<u64> = events
            .iter()
            .map(|e| e.data["rating"].as_u64().unwrap())
            .collect();
        assert_eq!(ratings, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn expired_replay_entries_are_not_delivered() {
        let fabric = BroadcastFabric::new(BroadcastConfig {
            replay_ttl_hours: 0,
            ..Default::default()
        });
        let diagnosis = Uuid::new_v4();

        fabric.publish(diagnosis, numbered_event(diagnosis, 1)).await;
        let sub = fabric.subscribe(diagnosis, Uuid::new_v4()).await;

        // Only the connect marker arrives
        let first = sub.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::Connect);
        assert!(sub.inbox.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_isolates_other_subscribers() {
        let fabric = BroadcastFabric::default();
        let diagnosis = Uuid::new_v4();

        let leaving = fabric.subscribe(diagnosis, Uuid::new_v4()).await;
        let staying = fabric.subscribe(diagnosis, Uuid::new_v4()).await;

        fabric.unsubscribe(&leaving).await;
        assert_eq!(fabric.subscriber_count(diagnosis).await, 1);

        let delivered = fabric.publish(diagnosis, numbered_event(diagnosis, 4)).await;
        assert_eq!(delivered, 1);
        let events = drain_live(&staying, 1).await;
        assert_eq!(events[0].data["rating"], 4);
        assert!(leaving.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_inbox_disconnects_only_that_subscriber() {
        let fabric = BroadcastFabric::default();
        let diagnosis = Uuid::new_v4();

        let broken = fabric.subscribe(diagnosis, Uuid::new_v4()).await;
        let healthy = fabric.subscribe(diagnosis, Uuid::new_v4()).await;

        // Simulate a dead transport without unsubscribing
        broken.inbox.close();

        let delivered = fabric.publish(diagnosis, numbered_event(diagnosis, 2)).await;
        assert_eq!(delivered, 1);
        assert_eq!(fabric.subscriber_count(diagnosis).await, 1);

        let events = drain_live(&healthy, 1).await;
        assert_eq!(events[0].data["rating"], 2);
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let fabric = BroadcastFabric::default();
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();

        let sub1 = fabric.subscribe(d1, Uuid::new_v4()).await;
        let _sub2 = fabric.subscribe(d2, Uuid::new_v4()).await;

        fabric.publish(d1, numbered_event(d1, 3)).await;
        assert_eq!(_sub2.pending(), 1); // connect marker only
        let events = drain_live(&sub1, 1).await;
        assert_eq!(events[0].diagnosis_id, d1);
    }
}
