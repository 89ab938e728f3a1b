//! Caller-facing client.
//!
//! Wires configuration, a dispatcher, the admission gate and the refill
//! scheduler together behind one handle.

use crate::application::{
    gate::{Admission, AdmissionGate, RefillReport, SubmitError},
    metrics::Metrics,
    ports::Dispatcher,
    scheduler::{RefillScheduler, SchedulerHandle, ShutdownError},
};
use crate::domain::{
    config::{ConfigError, RateLimiterConfig, Window},
    document::{Document, Submission},
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

#[cfg(feature = "http")]
use crate::infrastructure::http::{HttpDispatcher, HttpDispatcherConfig};

/// Error returned when building a `DocumentClient` fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Window or capacity is invalid
    #[error("invalid limiter configuration: {0}")]
    Config(#[from] ConfigError),
    /// The refill scheduler needs a tokio runtime and none is running
    #[error("refill scheduler requires a running tokio runtime")]
    NoRuntime,
    /// The HTTP client could not be created
    #[cfg(feature = "http")]
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Submissions left in the queue when the client shut down, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    abandoned: Vec<Submission>,
}

impl ShutdownReport {
    /// Submissions that were never dispatched.
    pub fn abandoned(&self) -> &[Submission] {
        &self.abandoned
    }

    /// Take ownership of the abandoned submissions.
    pub fn into_abandoned(self) -> Vec<Submission> {
        self.abandoned
    }
}

/// Builder for constructing a `DocumentClient`.
pub struct DocumentClientBuilder<D> {
    dispatcher: D,
    window: Window,
    capacity: u32,
    refill_scheduler: bool,
    metrics: Option<Metrics>,
}

impl<D: Dispatcher> DocumentClientBuilder<D> {
    /// Set the refill window.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Set how many submissions are dispatched per window.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Take window and capacity from an already validated config.
    pub fn with_config(mut self, config: RateLimiterConfig) -> Self {
        self.window = config.window();
        self.capacity = config.capacity();
        self
    }

    /// Enable or disable the background refill task.
    ///
    /// When disabled, tokens are only refilled through
    /// [`DocumentClient::refill_now`]. Useful for driving the limiter from
    /// an external clock or in tests.
    pub fn with_refill_scheduler(mut self, enabled: bool) -> Self {
        self.refill_scheduler = enabled;
        self
    }

    /// Record into an existing metrics tracker.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the client and, if enabled, start the refill scheduler.
    ///
    /// # Errors
    /// - `BuildError::Config` if the window or capacity is invalid.
    /// - `BuildError::NoRuntime` if the scheduler is enabled outside a tokio
    ///   runtime.
    pub fn build(self) -> Result<DocumentClient<D>, BuildError> {
        let config = RateLimiterConfig::new(self.window, self.capacity)?;

        if self.refill_scheduler && tokio::runtime::Handle::try_current().is_err() {
            return Err(BuildError::NoRuntime);
        }

        let metrics = self.metrics.unwrap_or_default();
        let gate = Arc::new(AdmissionGate::with_metrics(
            config,
            self.dispatcher,
            metrics,
        ));

        let scheduler = if self.refill_scheduler {
            SchedulerState::Running(RefillScheduler::new(Arc::clone(&gate)).start())
        } else {
            SchedulerState::Manual
        };

        info!(
            capacity = config.capacity(),
            window_ms = config.period().as_millis() as u64,
            scheduled = self.refill_scheduler,
            "document client started"
        );

        Ok(DocumentClient {
            gate,
            scheduler: Arc::new(Mutex::new(scheduler)),
        })
    }
}

#[derive(Debug)]
enum SchedulerState {
    Running(SchedulerHandle),
    Manual,
    Stopped,
}

/// Rate-limited client for the document-registration endpoint.
///
/// Clones share the same limiter; hand a clone to every producer.
pub struct DocumentClient<D> {
    gate: Arc<AdmissionGate<D>>,
    scheduler: Arc<Mutex<SchedulerState>>,
}

impl<D> Clone for DocumentClient<D> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<D: Dispatcher> DocumentClient<D> {
    /// Create a builder around the given dispatcher.
    ///
    /// Defaults:
    /// - Window: one second
    /// - Capacity: 1
    /// - Refill scheduler: enabled
    pub fn builder(dispatcher: D) -> DocumentClientBuilder<D> {
        DocumentClientBuilder {
            dispatcher,
            window: Window::Second,
            capacity: 1,
            refill_scheduler: true,
            metrics: None,
        }
    }

    /// Submit a document with its signature.
    ///
    /// Awaits the dispatch when a token is available; otherwise queues the
    /// submission and returns at once. See [`AdmissionGate::submit`].
    pub async fn create_document(
        &self,
        document: Document,
        signature: impl Into<String>,
    ) -> Result<Admission, SubmitError> {
        self.submit(Submission::new(document, signature)).await
    }

    /// Submit an already paired document and signature.
    pub async fn submit(&self, submission: Submission) -> Result<Admission, SubmitError> {
        self.gate.submit(submission).await
    }

    /// Refill tokens and drain the queue right now.
    ///
    /// Intended for clients built with the scheduler disabled; running it
    /// alongside the scheduler grants extra capacity inside a window.
    pub async fn refill_now(&self) -> RefillReport {
        self.gate.refill().await
    }

    /// Close the limiter and stop the refill scheduler.
    ///
    /// The limiter is closed first, so from the moment this is called every
    /// submit fails with `SubmitError::Closed` and `is_shut_down` is true.
    /// It then waits for an in-flight tick to finish and returns every
    /// submission that was still queued.
    ///
    /// # Errors
    /// - `ShutdownError::AlreadyStopped` on every call after the first; it
    ///   has no other effect.
    /// - `TaskPanicked`/`TaskCancelled` if the scheduler died. The limiter
    ///   is closed regardless.
    pub async fn shutdown(&self) -> Result<ShutdownReport, ShutdownError> {
        // Swap the state and close the gate under the lock, then release it before awaiting
        let (previous, abandoned) = {
            let mut state = self
                .scheduler
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let previous = std::mem::replace(&mut *state, SchedulerState::Stopped);
            if matches!(previous, SchedulerState::Stopped) {
                debug!("shutdown requested, client already stopped");
                return Err(ShutdownError::AlreadyStopped);
            }
            (previous, self.gate.close())
        };

        let stopped = match previous {
            SchedulerState::Running(handle) => handle.shutdown().await,
            SchedulerState::Manual | SchedulerState::Stopped => Ok(()),
        };

        info!(abandoned = abandoned.len(), "document client shut down");
        stopped.map(|()| ShutdownReport { abandoned })
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.gate.is_closed()
    }

    /// Tokens left in the current window.
    pub fn available_tokens(&self) -> u32 {
        self.gate.available_tokens()
    }

    /// Submissions waiting for a refill.
    pub fn queue_depth(&self) -> usize {
        self.gate.queue_depth()
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        self.gate.metrics()
    }

    /// The enforced configuration.
    pub fn config(&self) -> &RateLimiterConfig {
        self.gate.config()
    }

    /// Get a reference to the dispatcher.
    pub fn dispatcher(&self) -> &D {
        self.gate.dispatcher()
    }
}

#[cfg(feature = "http")]
impl DocumentClient<HttpDispatcher> {
    /// Client posting to the default endpoint with the refill scheduler
    /// running.
    ///
    /// # Errors
    /// See [`DocumentClientBuilder::build`]; also fails if the HTTP client
    /// cannot be created.
    pub fn http(config: RateLimiterConfig) -> Result<Self, BuildError> {
        Self::http_with(config, HttpDispatcherConfig::default())
    }

    /// Client posting with a custom HTTP configuration.
    pub fn http_with(
        config: RateLimiterConfig,
        http: HttpDispatcherConfig,
    ) -> Result<Self, BuildError> {
        let dispatcher =
            HttpDispatcher::new(http).map_err(|e| BuildError::HttpClient(e.to_string()))?;
        Self::builder(dispatcher).with_config(config).build()
    }
}
