//! # doc-throttle
//!
//! Client-side admission control for a document-registration API.
//!
//! At most `capacity` documents are sent per window. Submissions beyond that
//! wait in a FIFO queue and go out as soon as the next window grants new
//! tokens. Nothing is dropped silently: every submission is dispatched exactly
//! once, or handed back when the client shuts down.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_throttle::{Document, DocumentClient, RateLimiterConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // 10 documents per minute against the default endpoint
//! let client = DocumentClient::http(RateLimiterConfig::per_minute(10)?)?;
//!
//! let document = Document::with_id("doc-1");
//! let admission = client.create_document(document, "base64-signature").await?;
//! println!("{:?}", admission);
//!
//! // Stop refilling and collect whatever is still queued
//! let report = client.shutdown().await?;
//! println!("{} submissions abandoned", report.abandoned().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## How admission works
//!
//! ```text
//!   create_document ──► AdmissionGate ──(token)──► Dispatcher
//!                            │
//!                        (no token)
//!                            ▼
//!                      OverflowQueue ◄── RefillScheduler (every window:
//!                                        tokens = capacity, drain FIFO)
//! ```
//!
//! - The limiter starts with **zero** tokens. The scheduler's first tick
//!   fires immediately and grants the first window's capacity.
//! - Every tick **resets** the tokens to capacity; unused tokens never carry
//!   over.
//! - With a token available, `create_document` dispatches on the caller's
//!   task and returns the dispatch result. Without one, it queues and returns
//!   `Admission::Queued` at once.
//! - The admission decision is serialized; the network call is not. Slow
//!   dispatches never block other callers' decisions.
//! - Failed dispatches are logged and counted, never retried.
//!
//! ## Custom dispatchers
//!
//! Anything implementing [`Dispatcher`] can stand in for the HTTP adapter:
//!
//! ```rust
//! use doc_throttle::{DispatchError, Dispatcher, DocumentClient, Submission};
//!
//! struct Stdout;
//!
//! impl Dispatcher for Stdout {
//!     async fn dispatch(&self, submission: &Submission) -> Result<(), DispatchError> {
//!         println!("sending {}", submission.doc_id());
//!         Ok(())
//!     }
//! }
//!
//! let client = DocumentClient::builder(Stdout)
//!     .with_capacity(5)
//!     .with_refill_scheduler(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(client.queue_depth(), 0);
//! ```
//!
//! ## Observability
//!
//! All decisions are logged through `tracing` (admissions at DEBUG, drains
//! at INFO, abandonment at WARN, dispatch failures at ERROR). Counters are
//! available at any time:
//!
//! ```rust,no_run
//! # use doc_throttle::{DocumentClient, RateLimiterConfig};
//! # let client = DocumentClient::http(RateLimiterConfig::per_second(5).unwrap()).unwrap();
//! let snapshot = client.metrics().snapshot();
//! println!("queued rate: {:.1}%", snapshot.queued_rate() * 100.0);
//! println!("still pending: {}", snapshot.pending());
//! ```
//!
//! ## Shutdown
//!
//! Call [`DocumentClient::shutdown`] explicitly. It closes the limiter at
//! once, waits for any in-flight drain to finish, and returns the
//! submissions that were still queued. A second call returns `ShutdownError::AlreadyStopped`.
//! Dropping every client handle without shutting down stops the scheduler at
//! its next wakeup and logs the abandoned count.

// Domain layer - pure types and invariants
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

pub use domain::{
    config::{ConfigError, RateLimiterConfig, Window},
    document::{Description, Document, Product, Submission},
    queue::OverflowQueue,
    tokens::TokenStore,
};

pub use application::{
    gate::{Admission, AdmissionGate, RefillReport, SubmitError},
    metrics::{Metrics, MetricsSnapshot},
    ports::{DispatchError, Dispatcher},
    scheduler::{RefillScheduler, SchedulerHandle, ShutdownError},
};

pub use infrastructure::client::{
    BuildError, DocumentClient, DocumentClientBuilder, ShutdownReport,
};

#[cfg(feature = "http")]
pub use infrastructure::http::{HttpDispatcher, HttpDispatcherConfig, DEFAULT_CREATE_URL};
