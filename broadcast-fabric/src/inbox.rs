use crate::error::{BroadcastError, BroadcastResult};
use crate::events::UpdateEvent;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

/// Bounded subscriber inbox with drop-oldest backpressure
///
/// `push` never blocks: at capacity the oldest pending event is dropped and
/// the subscription's drop counter incremented. `recv` waits for the next
/// event or returns `None` once the inbox is closed and drained of nothing
/// (close clears pending events; a disconnected subscriber does not receive
/// stragglers).
pub struct Inbox {
    queue: Mutex<VecDeque<UpdateEvent>>,
    notify: Notify,
    capacity: usize,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity: capacity.max(1),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue one event, evicting the oldest when full
    pub fn push(&self, event: UpdateEvent) -> BroadcastResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BroadcastError::InboxClosed("subscriber gone".to_string()));
        }

        let mut queue = self.queue.lock().expect("inbox mutex poisoned");
        if queue.len() == self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(event);
        drop(queue);

        self.notify.notify_one();
        Ok(())
    }

    /// Next event, or `None` after close
    pub async fn recv(&self) -> Option<UpdateEvent> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.queue.lock().expect("inbox mutex poisoned");
                if let Some(event) = queue.pop_front() {
                    return Some(event);
                }
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    /// `recv` bounded by the transport's drain deadline
    pub async fn recv_timeout(&self, timeout: Duration) -> BroadcastResult<Option<UpdateEvent>> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| BroadcastError::SendTimeout(format!("no drain within {timeout:?}")))
    }

    /// Close and drop all pending events
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.queue.lock().expect("inbox mutex poisoned").clear();
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().expect("inbox mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events evicted from this inbox due to backpressure
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// A live subscription to one diagnosis topic
pub struct Subscription {
    pub diagnosis_id: Uuid,
    pub subscriber_id: Uuid,
    pub(crate) inbox: Arc<Inbox>,
}

impl Subscription {
    pub async fn recv(&self) -> Option<UpdateEvent> {
        self.inbox.recv().await
    }

    pub async fn recv_timeout(&self, timeout: Duration) -> BroadcastResult<Option<UpdateEvent>> {
        self.inbox.recv_timeout(timeout).await
    }

    pub fn dropped_count(&self) -> u64 {
        self.inbox.dropped_count()
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}
