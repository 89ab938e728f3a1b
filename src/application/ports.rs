//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::document::Submission;
use std::future::Future;
use std::sync::Arc;

/// Error returned by a dispatcher when a submission could not be delivered.
///
/// Dispatch failures are terminal: the limiter logs and counts them but never
/// retries or re-queues the submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The request never produced a response (connect, TLS, timeout, ...)
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status
    #[error("endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },
    /// The payload could not be encoded
    #[error("failed to encode document: {0}")]
    Serialization(String),
    /// Any other refusal reported by a custom dispatcher
    #[error("dispatch rejected: {0}")]
    Rejected(String),
}

/// Port for delivering an admitted submission to the remote endpoint.
///
/// The limiter calls this exactly once per submission, after the admission
/// decision has been made and the gate lock released. Implementations only
/// need to report success or failure; response bodies are not interpreted.
pub trait Dispatcher: Send + Sync + 'static {
    /// Deliver one submission.
    fn dispatch(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

impl<D: Dispatcher> Dispatcher for Arc<D> {
    fn dispatch(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (**self).dispatch(submission)
    }
}
