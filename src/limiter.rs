//! Bounded-concurrency admission control for probe tasks.
//!
//! This module provides the [`Limiter`] struct which guarantees that at most
//! `N` submitted tasks are in flight at any moment, regardless of how many
//! are requested. Everything that touches the network goes through it.
//!
//! # Ordering
//!
//! The limiter is built on a fair [`tokio::sync::Semaphore`]: tasks begin
//! execution in submission order, subject to capacity. A finishing task frees
//! its slot and the next queued task is admitted immediately. Completion
//! order is unconstrained.
//!
//! # Example
//!
//! ```
//! use paperstack::limiter::Limiter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Limiter::new(6)?;
//! let value = limiter.run(async { 40 + 2 }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::debug;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default number of in-flight availability probes.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 6;

/// Error type for limiter construction and task admission.
#[derive(Debug, thiserror::Error)]
pub enum LimiterError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("limiter semaphore closed unexpectedly")]
    Closed,
}

/// Bounded-parallelism task scheduler.
///
/// The limiter never drops a submission and never starts a task twice. Each
/// call to [`run`](Self::run) resolves with exactly the task's own output;
/// one task's failure does not affect the scheduling of others.
///
/// `Limiter` is cheap to clone — clones share the same capacity pool.
#[derive(Debug, Clone)]
pub struct Limiter {
    /// Fair semaphore enforcing the concurrency bound.
    semaphore: Arc<Semaphore>,
    /// Number of tasks currently holding a permit (observability only).
    active: Arc<AtomicUsize>,
    /// Configured concurrency bound.
    max_concurrency: usize,
}

impl Limiter {
    /// Creates a new limiter with the given concurrency bound (1-100).
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::InvalidConcurrency`] if the value is outside
    /// the valid range.
    pub fn new(max_concurrency: usize) -> Result<Self, LimiterError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&max_concurrency) {
            return Err(LimiterError::InvalidConcurrency {
                value: max_concurrency,
            });
        }

        debug!(max_concurrency, "creating limiter");

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            active: Arc::new(AtomicUsize::new(0)),
            max_concurrency,
        })
    }

    /// Returns the configured concurrency bound.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Returns the number of tasks currently in flight.
    ///
    /// Invariant: `active() <= max_concurrency()` at all times.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Runs `task` once a capacity slot is available and returns its output.
    ///
    /// The slot is held for the task's whole lifetime and released when the
    /// task completes (or is dropped mid-flight). No timeout or cancellation
    /// is applied here — those are the task's own responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`LimiterError::Closed`] if the semaphore was closed, which
    /// callers treat as that task's failure.
    pub async fn run<F, T>(&self, task: F) -> Result<T, LimiterError>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| LimiterError::Closed)?;
        let _slot = ActiveSlot::enter(&self.active);
        Ok(task.await)
    }
}

/// RAII guard tracking the in-flight task count.
struct ActiveSlot<'a> {
    active: &'a AtomicUsize,
}

impl<'a> ActiveSlot<'a> {
    fn enter(active: &'a AtomicUsize) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_limiter_new_valid_bounds() {
        assert!(Limiter::new(1).is_ok());
        assert!(Limiter::new(100).is_ok());
        assert!(Limiter::new(DEFAULT_PROBE_CONCURRENCY).is_ok());
    }

    #[test]
    fn test_limiter_new_zero_rejected() {
        let result = Limiter::new(0);
        assert!(matches!(
            result,
            Err(LimiterError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_limiter_new_above_max_rejected() {
        let result = Limiter::new(101);
        assert!(matches!(
            result,
            Err(LimiterError::InvalidConcurrency { value: 101 })
        ));
    }

    #[tokio::test]
    async fn test_run_returns_task_output() {
        let limiter = Limiter::new(2).unwrap();
        let value = limiter.run(async { "hello" }).await.unwrap();
        assert_eq!(value, "hello");
    }

    #[tokio::test]
    async fn test_run_propagates_task_error_unchanged() {
        let limiter = Limiter::new(2).unwrap();
        let outcome: Result<u32, &str> = limiter.run(async { Err("boom") }).await.unwrap();
        assert_eq!(outcome, Err("boom"));
    }

    #[tokio::test]
    async fn test_one_failing_task_does_not_affect_others() {
        let limiter = Limiter::new(1).unwrap();

        let failed: Result<u32, &str> = limiter.run(async { Err("boom") }).await.unwrap();
        assert!(failed.is_err());

        // The failed task released its slot; the next task runs normally.
        let ok = limiter.run(async { 7 }).await.unwrap();
        assert_eq!(ok, 7);
    }

    #[tokio::test]
    async fn test_active_never_exceeds_bound_under_burst() {
        const BOUND: usize = 3;
        const BURST: usize = 20;

        let limiter = Limiter::new(BOUND).unwrap();
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..BURST {
            let limiter = limiter.clone();
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                limiter
                    .run(async {
                        let seen = limiter.active();
                        max_seen.fetch_max(seen, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        let seen = limiter.active();
                        max_seen.fetch_max(seen, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert!(
            max_seen.load(Ordering::SeqCst) <= BOUND,
            "active count exceeded the bound: {}",
            max_seen.load(Ordering::SeqCst)
        );
        assert_eq!(limiter.active(), 0, "all slots released after the burst");
    }

    #[tokio::test]
    async fn test_tasks_start_in_submission_order() {
        // Current-thread runtime: spawn + yield gives deterministic poll order.
        let limiter = Limiter::new(1).unwrap();
        let started = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..5u32 {
            let limiter = limiter.clone();
            let started = Arc::clone(&started);
            handles.push(tokio::spawn(async move {
                limiter
                    .run(async {
                        started.lock().unwrap().push(i);
                    })
                    .await
                    .unwrap();
            }));
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*started.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_no_submission_dropped() {
        let limiter = Limiter::new(2).unwrap();
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let limiter = limiter.clone();
            let completed = Arc::clone(&completed);
            handles.push(tokio::spawn(async move {
                limiter
                    .run(async {
                        completed.fetch_add(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(completed.load(Ordering::SeqCst), 50);
    }
}
