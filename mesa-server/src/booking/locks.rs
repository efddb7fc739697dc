//! Per-slot async locks serializing admission
//!
//! The time axis is split into buckets of one slot granularity; every
//! admission-relevant write acquires the locks of all buckets its window
//! touches, in ascending bucket order (deadlock-free), before reading the
//! overlap set. Two requests for unrelated evenings never contend.
//!
//! Acquisition is bounded: if the locks cannot be taken within the
//! configured wait the caller gets [`AppError::Busy`] (503) instead of an
//! unbounded queue.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{Instant, timeout_at};

use crate::utils::{AppError, AppResult};

/// Drop the guard to release the window
#[derive(Debug)]
pub struct WindowGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// Lock registry keyed by time bucket
///
/// Buckets for quiet periods are pruned once the map grows large; an Arc
/// still held by an in-flight request survives pruning.
pub struct SlotLockRegistry {
    buckets: DashMap<i64, Arc<Mutex<()>>>,
    bucket_millis: i64,
    max_wait: Duration,
}

const PRUNE_THRESHOLD: usize = 4096;

impl SlotLockRegistry {
    pub fn new(granularity_minutes: i64, max_wait: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            bucket_millis: granularity_minutes * 60_000,
            max_wait,
        }
    }

    fn bucket_of(&self, millis: i64) -> i64 {
        millis.div_euclid(self.bucket_millis)
    }

    fn handle(&self, bucket: i64) -> Arc<Mutex<()>> {
        self.buckets
            .entry(bucket)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn prune(&self) {
        if self.buckets.len() > PRUNE_THRESHOLD {
            self.buckets.retain(|_, m| Arc::strong_count(m) > 1);
        }
    }

    /// Lock every bucket touched by `[start, end)`
    pub async fn lock_window(&self, start: i64, end: i64) -> AppResult<WindowGuard> {
        self.lock_windows(&[(start, end)]).await
    }

    /// Lock the union of buckets touched by several windows (reschedule
    /// holds the old and the new window at once)
    pub async fn lock_windows(&self, windows: &[(i64, i64)]) -> AppResult<WindowGuard> {
        let mut buckets = Vec::new();
        for &(start, end) in windows {
            let mut b = self.bucket_of(start);
            // end is exclusive
            let last = self.bucket_of(end - 1);
            while b <= last {
                buckets.push(b);
                b += 1;
            }
        }
        buckets.sort_unstable();
        buckets.dedup();

        self.prune();

        let deadline = Instant::now() + self.max_wait;
        let mut guards = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let mutex = self.handle(bucket);
            match timeout_at(deadline, mutex.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    tracing::warn!(bucket, "Slot lock wait exceeded, rejecting with Busy");
                    return Err(AppError::Busy);
                }
            }
        }
        Ok(WindowGuard { _guards: guards })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SlotLockRegistry {
        SlotLockRegistry::new(30, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn disjoint_windows_do_not_contend() {
        let locks = registry();
        let _a = locks.lock_window(0, 90 * 60_000).await.unwrap();
        // Far-away window locks immediately even while the first is held
        let _b = locks
            .lock_window(6 * 3_600_000, 6 * 3_600_000 + 90 * 60_000)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn overlapping_window_times_out_with_busy() {
        let locks = registry();
        let _held = locks.lock_window(0, 90 * 60_000).await.unwrap();
        let err = locks.lock_window(60 * 60_000, 150 * 60_000).await.unwrap_err();
        assert!(matches!(err, AppError::Busy));
    }

    #[tokio::test]
    async fn released_window_can_be_relocked() {
        let locks = registry();
        let guard = locks.lock_window(0, 90 * 60_000).await.unwrap();
        drop(guard);
        let _again = locks.lock_window(0, 90 * 60_000).await.unwrap();
    }

    #[tokio::test]
    async fn reschedule_locks_both_windows_without_deadlock() {
        let locks = Arc::new(registry());

        // Two tasks locking the same pair of windows in opposite argument
        // order; sorted acquisition means both finish
        let l1 = locks.clone();
        let t1 = tokio::spawn(async move {
            for _ in 0..20 {
                let _g = l1
                    .lock_windows(&[(0, 90 * 60_000), (7_200_000, 7_200_000 + 90 * 60_000)])
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        });
        let l2 = locks.clone();
        let t2 = tokio::spawn(async move {
            for _ in 0..20 {
                let _g = l2
                    .lock_windows(&[(7_200_000, 7_200_000 + 90 * 60_000), (0, 90 * 60_000)])
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        });
        t1.await.unwrap();
        t2.await.unwrap();
    }

    #[test]
    fn negative_timestamps_bucket_consistently() {
        let locks = registry();
        // div_euclid keeps buckets monotone across zero
        assert!(locks.bucket_of(-1) < locks.bucket_of(0));
        assert_eq!(locks.bucket_of(-1), locks.bucket_of(-30 * 60_000));
    }
}
