//! Per-(entity_id, task_type) advisory locks.
//!
//! The task store has no conditional write, so the submitter serializes the
//! check-and-mark-submitting step for each key through these locks.
//!
//! ```rust
//! use spatial_ingestor::models::JobType;
//! use spatial_ingestor::orchestration::SubmissionLocks;
//!
//! # tokio_test::block_on(async {
//! let locks = SubmissionLocks::new();
//! {
//!     let _guard = locks.acquire("r1", JobType::SpatialIngest).await;
//!     assert_eq!(locks.active(), 1);
//! }
//! // Released keys are dropped from the map
//! assert_eq!(locks.active(), 0);
//! # });
//! ```

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::JobType;

type LockKey = (String, JobType);

#[derive(Debug, Default)]
pub struct SubmissionLocks {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

/// Held while a submission inspects and marks its task record
#[derive(Debug)]
pub struct SubmissionGuard<'a> {
    locks: &'a SubmissionLocks,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SubmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, entity_id: &str, task_type: JobType) -> SubmissionGuard<'_> {
        let key = (entity_id.to_string(), task_type);
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        SubmissionGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys currently locked or awaited
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the mutex: nobody holds or awaits it.
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_are_released() {
        let locks = SubmissionLocks::new();
        {
            let _guard = locks.acquire("r1", JobType::SpatialIngest).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(SubmissionLocks::new());
        let guard = locks.acquire("r1", JobType::SpatialIngest).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("r1", JobType::SpatialIngest).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // A different key is independent
        let _other = locks.acquire("r1", JobType::SpatialPurge).await;

        drop(guard);
        contender.await.unwrap();
    }
}
