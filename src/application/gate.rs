//! Admission gate coordination logic.
//!
//! The gate decides, for every submission, whether it can be dispatched now
//! (consuming a token) or has to wait in the overflow queue. It also performs
//! the drain step when the refill scheduler resets the tokens.
//!
//! Token count, queue and the closed flag sit behind one mutex. Every
//! decision (submit, refill, close) is a single short critical section; the
//! dispatch itself always happens after the lock is released.

use crate::application::metrics::Metrics;
use crate::application::ports::{DispatchError, Dispatcher};
use crate::domain::{
    config::RateLimiterConfig, document::Submission, queue::OverflowQueue, tokens::TokenStore,
};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Outcome of a successful `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A token was available and the submission has been delivered
    Dispatched,
    /// No token was available; the submission waits for a later refill
    Queued {
        /// Queue depth right after this submission was appended
        depth: usize,
    },
}

impl Admission {
    /// Whether the submission was delivered on the caller's task.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Admission::Dispatched)
    }

    /// Whether the submission was deferred to the overflow queue.
    pub fn is_queued(&self) -> bool {
        matches!(self, Admission::Queued { .. })
    }
}

/// Error returned by `submit`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Admitted immediately, but the dispatcher failed. Not retried.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The gate is shut down; the submission is handed back untouched
    #[error("limiter is shut down, submission {} was not accepted", .0.doc_id())]
    Closed(Box<Submission>),
}

/// What a single refill did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefillReport {
    /// Queued submissions handed to the dispatcher
    pub drained: usize,
    /// How many of those dispatches failed
    pub failed: usize,
    /// Tokens left for immediate submits once the drain batch was taken
    pub tokens_remaining: u32,
    /// Submissions still waiting for a later refill
    pub still_queued: usize,
}

#[derive(Debug)]
struct GateState {
    tokens: TokenStore,
    queue: OverflowQueue<Submission>,
    closed: bool,
}

/// The synchronized admission decision point.
///
/// Share it through an `Arc`; `submit` may be called from any number of tasks
/// or threads concurrently.
#[derive(Debug)]
pub struct AdmissionGate<D> {
    config: RateLimiterConfig,
    state: Mutex<GateState>,
    dispatcher: D,
    metrics: Metrics,
}

impl<D: Dispatcher> AdmissionGate<D> {
    /// Create a gate with zero tokens. Nothing is admitted until the first
    /// refill.
    pub fn new(config: RateLimiterConfig, dispatcher: D) -> Self {
        Self::with_metrics(config, dispatcher, Metrics::new())
    }

    /// Create a gate that records into an existing metrics tracker.
    pub fn with_metrics(config: RateLimiterConfig, dispatcher: D, metrics: Metrics) -> Self {
        Self {
            config,
            state: Mutex::new(GateState {
                tokens: TokenStore::new(config.capacity()),
                queue: OverflowQueue::new(),
                closed: false,
            }),
            dispatcher,
            metrics,
        }
    }

    /// Admit a submission or queue it.
    ///
    /// With a token available, the token is taken, the lock released, and the
    /// submission dispatched on the caller's task; the returned future
    /// completes once the dispatch does. Otherwise the submission is appended
    /// to the overflow queue and this returns immediately.
    ///
    /// # Errors
    /// - `SubmitError::Dispatch` if the immediate dispatch failed. The token
    ///   stays spent and the submission is not re-queued.
    /// - `SubmitError::Closed` after [`close`](Self::close).
    ///
    /// # Cancellation
    /// Dropping the future after admission abandons that dispatch; the token
    /// is not returned.
    pub async fn submit(&self, submission: Submission) -> Result<Admission, SubmitError> {
        let admitted = {
            let mut state = self.lock_state();
            if state.closed {
                return Err(SubmitError::Closed(Box::new(submission)));
            }

            if state.tokens.try_acquire() {
                debug!(
                    doc_id = submission.doc_id(),
                    tokens_remaining = state.tokens.available(),
                    "submission admitted"
                );
                Ok(submission)
            } else {
                debug!(doc_id = submission.doc_id(), "no token available, queueing");
                Err(state.queue.push(submission))
            }
        };

        match admitted {
            Ok(submission) => {
                self.metrics.record_admitted();
                self.deliver(&submission).await?;
                Ok(Admission::Dispatched)
            }
            Err(depth) => {
                self.metrics.record_queued();
                Ok(Admission::Queued { depth })
            }
        }
    }

    /// Reset tokens to capacity and drain the overflow queue.
    ///
    /// Oldest submissions are taken first, one token each, until the queue is
    /// empty or the tokens run out. The batch is taken under the lock and
    /// dispatched sequentially after it is released, so FIFO order holds
    /// among drained submissions while new submits keep being decided.
    ///
    /// Meant to be driven by a single caller at a time (the refill
    /// scheduler); two overlapping refills would each keep their own batch in
    /// order but could interleave with each other.
    ///
    /// A closed gate ignores refills.
    ///
    /// # Cancellation
    /// Dropping the future mid-drain puts the batch's unsent submissions
    /// back at the head of the queue; their tokens stay spent. The one being
    /// dispatched at that moment has an unknown outcome, so it is counted as
    /// abandoned rather than sent twice.
    pub async fn refill(&self) -> RefillReport {
        let (batch, tokens_remaining, still_queued) = {
            let mut state = self.lock_state();
            if state.closed {
                debug!("refill skipped, gate is closed");
                return RefillReport::default();
            }

            state.tokens.refill();
            let mut batch = VecDeque::new();
            while state.tokens.available() > 0 {
                let Some(submission) = state.queue.pop() else {
                    break;
                };
                let acquired = state.tokens.try_acquire();
                debug_assert!(acquired);
                batch.push_back(submission);
            }

            (batch, state.tokens.available(), state.queue.len())
        };

        self.metrics.record_refill();

        let mut drain = DrainBatch {
            gate: self,
            pending: batch,
            in_flight: None,
        };
        let mut drained = 0;
        let mut failed = 0;
        while let Some(submission) = drain.pending.pop_front() {
            let submission = drain.in_flight.insert(submission);
            let delivered = self.deliver(submission).await.is_ok();
            drain.in_flight = None;

            self.metrics.record_drained(1);
            drained += 1;
            if !delivered {
                failed += 1;
            }
        }

        if drained > 0 {
            info!(
                drained,
                failed, tokens_remaining, still_queued, "drained overflow queue"
            );
        } else {
            debug!(tokens_remaining, "tokens refilled, queue empty");
        }

        RefillReport {
            drained,
            failed,
            tokens_remaining,
            still_queued,
        }
    }

    /// Stop accepting submissions and refills.
    ///
    /// Returns everything still queued, oldest first, so abandonment is
    /// observable. Closing an already closed gate returns nothing.
    pub fn close(&self) -> Vec<Submission> {
        let abandoned = {
            let mut state = self.lock_state();
            if state.closed {
                return Vec::new();
            }
            state.closed = true;
            state.tokens.clear();
            state.queue.drain_all()
        };

        if !abandoned.is_empty() {
            self.metrics.record_abandoned(abandoned.len() as u64);
            warn!(
                count = abandoned.len(),
                "abandoning queued submissions, limiter closed"
            );
        }

        abandoned
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Tokens left in the current window.
    pub fn available_tokens(&self) -> u32 {
        self.lock_state().tokens.available()
    }

    /// Submissions waiting for a refill.
    pub fn queue_depth(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// The configuration this gate enforces.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get a reference to the dispatcher.
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    async fn deliver(&self, submission: &Submission) -> Result<(), DispatchError> {
        let result = self.dispatcher.dispatch(submission).await;
        if let Err(e) = &result {
            self.metrics.record_dispatch_failure();
            error!(
                doc_id = submission.doc_id(),
                error = %e,
                "dispatch failed, submission dropped"
            );
        }
        result
    }
}

impl<D> AdmissionGate<D> {
    // Critical sections never leave GateState half-updated, so a poisoned
    // lock still guards consistent data.
    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn restore_interrupted(&self, in_flight: Option<Submission>, unsent: VecDeque<Submission>) {
        let mut abandoned = 0;
        if let Some(submission) = &in_flight {
            warn!(
                doc_id = submission.doc_id(),
                "drain interrupted mid-dispatch, outcome unknown, not retried"
            );
            abandoned += 1;
        }

        let requeued = {
            let mut state = self.lock_state();
            if state.closed {
                abandoned += unsent.len();
                0
            } else {
                state.queue.requeue_front(unsent)
            }
        };

        if abandoned > 0 {
            self.metrics.record_abandoned(abandoned as u64);
        }
        if requeued > 0 {
            warn!(
                requeued,
                "drain interrupted, unsent submissions back at the head of the queue"
            );
        }
    }
}

/// Submissions a refill has taken off the queue but not finished sending.
struct DrainBatch<'a, D> {
    gate: &'a AdmissionGate<D>,
    pending: VecDeque<Submission>,
    in_flight: Option<Submission>,
}

impl<D> Drop for DrainBatch<'_, D> {
    fn drop(&mut self) {
        if self.in_flight.is_none() && self.pending.is_empty() {
            return;
        }
        let unsent = std::mem::take(&mut self.pending);
        self.gate.restore_interrupted(self.in_flight.take(), unsent);
    }
}
