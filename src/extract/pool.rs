//! Bounded worker pool for the blocking extraction engine.
//!
//! Extraction calls are synchronous by nature and must never run on the
//! request-handling scheduler. Work is offloaded to `spawn_blocking`, with a
//! semaphore capping how many extraction calls run at once; callers past
//! capacity queue on the permit instead of spawning unbounded threads.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{Error, Result};

/// Fixed-capacity executor for blocking closures.
#[derive(Debug)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl BlockingPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run `work` on the blocking pool, waiting for a free slot first.
    pub async fn run<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::internal("extraction pool closed"))?;

        tokio::task::spawn_blocking(move || {
            let result = work();
            drop(permit);
            result
        })
        .await
        .map_err(|e| Error::internal(format!("extraction task panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_work_and_returns_result() {
        let pool = BlockingPool::new(4);
        let out = pool.run(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn propagates_work_errors() {
        let pool = BlockingPool::new(1);
        let err = pool
            .run::<(), _>(|| Err(Error::extractor("boom")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extractor(_)));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_capacity() {
        let pool = Arc::new(BlockingPool::new(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            let running = running.clone();
            let peak = peak.clone();
            tasks.push(tokio::spawn(async move {
                pool.run(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
