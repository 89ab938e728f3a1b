//! Observability metrics for admission control.
//!
//! Counts what the gate and the refill scheduler did, for monitoring and
//! debugging. Counters only ever grow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Submissions dispatched on the caller's task
    admitted: AtomicU64,
    /// Submissions that went to the overflow queue
    queued: AtomicU64,
    /// Queued submissions dispatched by a refill
    drained: AtomicU64,
    /// Dispatch attempts that failed, on either path
    dispatch_failures: AtomicU64,
    /// Queued submissions left undelivered at shutdown
    abandoned: AtomicU64,
    /// Refill ticks processed
    refills: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queued(&self) {
        self.inner.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drained(&self, count: u64) {
        self.inner.drained.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatch_failure(&self) {
        self.inner.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self, count: u64) {
        self.inner.abandoned.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_refill(&self) {
        self.inner.refills.fetch_add(1, Ordering::Relaxed);
    }

    /// Submissions dispatched immediately.
    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    /// Submissions that had to wait in the queue.
    pub fn queued(&self) -> u64 {
        self.inner.queued.load(Ordering::Relaxed)
    }

    /// Queued submissions dispatched by refills.
    pub fn drained(&self) -> u64 {
        self.inner.drained.load(Ordering::Relaxed)
    }

    /// Failed dispatch attempts.
    pub fn dispatch_failures(&self) -> u64 {
        self.inner.dispatch_failures.load(Ordering::Relaxed)
    }

    /// Submissions abandoned at shutdown.
    pub fn abandoned(&self) -> u64 {
        self.inner.abandoned.load(Ordering::Relaxed)
    }

    /// Refill ticks processed.
    pub fn refills(&self) -> u64 {
        self.inner.refills.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted(),
            queued: self.queued(),
            drained: self.drained(),
            dispatch_failures: self.dispatch_failures(),
            abandoned: self.abandoned(),
            refills: self.refills(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Submissions dispatched immediately
    pub admitted: u64,
    /// Submissions that went to the overflow queue
    pub queued: u64,
    /// Queued submissions dispatched by refills
    pub drained: u64,
    /// Failed dispatch attempts
    pub dispatch_failures: u64,
    /// Submissions abandoned at shutdown
    pub abandoned: u64,
    /// Refill ticks processed
    pub refills: u64,
}

impl MetricsSnapshot {
    /// Total submissions accepted by the gate.
    pub fn total_submissions(&self) -> u64 {
        self.admitted.saturating_add(self.queued)
    }

    /// Dispatch attempts made so far, successful or not.
    pub fn dispatch_attempts(&self) -> u64 {
        self.admitted.saturating_add(self.drained)
    }

    /// Submissions still waiting: queued but neither drained nor abandoned.
    pub fn pending(&self) -> u64 {
        self.queued
            .saturating_sub(self.drained)
            .saturating_sub(self.abandoned)
    }

    /// Fraction of submissions that had to wait (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing has been submitted.
    pub fn queued_rate(&self) -> f64 {
        let total = self.total_submissions();
        if total == 0 {
            0.0
        } else {
            self.queued as f64 / total as f64
        }
    }
}
