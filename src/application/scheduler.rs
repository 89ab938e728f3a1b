//! Periodic token refill.
//!
//! Runs a background task that refills the gate once per window. The first
//! tick fires immediately, so a fresh limiter gets its capacity as soon as
//! the task is polled.

use crate::application::gate::AdmissionGate;
use crate::application::ports::Dispatcher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Error returned when stopping the refill scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShutdownError {
    /// The scheduler was already stopped by an earlier call
    #[error("refill scheduler already stopped")]
    AlreadyStopped,
    /// The scheduler task panicked
    #[error("refill scheduler task panicked")]
    TaskPanicked,
    /// The scheduler task was cancelled by the runtime
    #[error("refill scheduler task was cancelled")]
    TaskCancelled,
}

/// Refills an admission gate on a fixed cadence.
pub struct RefillScheduler<D> {
    gate: Arc<AdmissionGate<D>>,
    period: Duration,
}

impl<D: Dispatcher> RefillScheduler<D> {
    /// Create a scheduler ticking at the gate's configured window.
    pub fn new(gate: Arc<AdmissionGate<D>>) -> Self {
        let period = gate.config().period();
        Self { gate, period }
    }

    /// Refill period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the refill task on the current tokio runtime.
    ///
    /// Ticks are serialized: a tick's drain runs to completion before the
    /// next tick is considered. When a drain outlasts the window, the late
    /// tick fires as soon as it ends and the schedule restarts from there,
    /// so two refills are always at least one window apart.
    ///
    /// Stop it with [`SchedulerHandle::shutdown`]. If the handle is dropped
    /// instead, the task stops at its next wakeup and closes the gate,
    /// logging whatever it abandons.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let Self { gate, period } = self;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(period_ms = period.as_millis() as u64, "refill scheduler started");

            loop {
                tokio::select! {
                    biased;
                    signal = &mut shutdown_rx => {
                        if signal.is_err() {
                            // Handle dropped without an explicit shutdown
                            let abandoned = gate.close();
                            warn!(
                                abandoned = abandoned.len(),
                                "scheduler handle dropped, limiter closed"
                            );
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        gate.refill().await;
                    }
                }
            }

            debug!("refill scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }
}

/// Handle to a running refill scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait for it to exit.
    ///
    /// A tick already in progress finishes its drain first. No tick runs
    /// after this returns.
    ///
    /// # Errors
    /// Returns `TaskPanicked` or `TaskCancelled` if the task did not exit
    /// cleanly.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        // The task may already be gone, in which case there is no one to tell
        let _ = self.shutdown_tx.send(());

        match self.task.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_panic() => Err(ShutdownError::TaskPanicked),
            Err(_) => Err(ShutdownError::TaskCancelled),
        }
    }

    /// Whether the scheduler task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{RateLimiterConfig, Window};
    use crate::domain::document::{Document, Submission};
    use crate::infrastructure::mocks::RecordingDispatcher;

    fn setup(capacity: u32) -> (Arc<AdmissionGate<RecordingDispatcher>>, RecordingDispatcher) {
        let dispatcher = RecordingDispatcher::new();
        let config = RateLimiterConfig::new(Window::Second, capacity).unwrap();
        (
            Arc::new(AdmissionGate::new(config, dispatcher.clone())),
            dispatcher,
        )
    }

    async fn enqueue(gate: &AdmissionGate<RecordingDispatcher>, count: usize) {
        for i in 0..count {
            let submission = Submission::new(Document::with_id(format!("q{}", i)), "sig");
            assert!(gate.submit(submission).await.unwrap().is_queued());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let (gate, dispatcher) = setup(3);
        enqueue(&gate, 2).await;

        let handle = RefillScheduler::new(Arc::clone(&gate)).start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(dispatcher.delivered_ids(), vec!["q0", "q1"]);
        assert_eq!(gate.available_tokens(), 1);
        assert_eq!(gate.metrics().refills(), 1);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_window() {
        let (gate, dispatcher) = setup(1);
        enqueue(&gate, 3).await;

        let handle = RefillScheduler::new(Arc::clone(&gate)).start();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(dispatcher.count(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(dispatcher.count(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(dispatcher.delivered_ids(), vec!["q0", "q1", "q2"]);
        assert_eq!(gate.metrics().refills(), 3);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_shutdown() {
        let (gate, dispatcher) = setup(2);
        let handle = RefillScheduler::new(Arc::clone(&gate)).start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        handle.shutdown().await.unwrap();
        let refills = gate.metrics().refills();

        // Spend the leftover tokens, then queue more
        enqueue_after_tokens(&gate).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(gate.metrics().refills(), refills);
        assert_eq!(gate.queue_depth(), 1);
        assert_eq!(dispatcher.count(), 2);
    }

    async fn enqueue_after_tokens(gate: &AdmissionGate<RecordingDispatcher>) {
        for i in 0..3 {
            let submission = Submission::new(Document::with_id(format!("s{}", i)), "sig");
            gate.submit(submission).await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_closes_gate() {
        let (gate, _dispatcher) = setup(1);
        let handle = RefillScheduler::new(Arc::clone(&gate)).start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        enqueue_after_tokens(&gate).await;
        assert_eq!(gate.queue_depth(), 2);

        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(gate.is_closed());
        assert_eq!(gate.metrics().abandoned(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_finished() {
        let (gate, _dispatcher) = setup(1);
        let scheduler = RefillScheduler::new(gate);
        assert_eq!(scheduler.period(), Duration::from_secs(1));

        let handle = scheduler.start();
        assert!(!handle.is_finished());
        handle.shutdown().await.unwrap();
    }
}
