use crate::error::{CoordinatorError, CoordinatorResult};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Bounded offload pool for CPU-heavy scoring
///
/// Scoring stays inline while it fits the per-call latency budget; larger
/// knowledge bases go through `run`, which limits concurrent blocking tasks
/// to the configured worker count so scoring can never starve the runtime.
pub struct ScoringPool {
    semaphore: Arc<Semaphore>,
}

impl ScoringPool {
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn run<F, T>(&self, task: F) -> CoordinatorResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| CoordinatorError::Internal("scoring pool closed".to_string()))?;

        tokio::task::spawn_blocking(task)
            .await
            .map_err(|e| CoordinatorError::Internal(format!("scoring task panicked: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn runs_tasks_and_returns_results() {
        let pool = ScoringPool::new(2);
        let result = pool.run(|| 21 * 2).await.unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn concurrency_is_bounded_by_worker_count() {
        let pool = Arc::new(ScoringPool::new(2));
        let peak = Arc::new(AtomicUsize::new(0));
        let current = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let peak = peak.clone();
            let current = current.clone();
            handles.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    current.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
