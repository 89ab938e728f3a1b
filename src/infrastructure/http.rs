//! HTTP adapter for the dispatcher port.
//!
//! POSTs the document as JSON to the registration endpoint with the detached
//! signature in a `Signature` header. Only the status code decides success;
//! the response body is logged and otherwise ignored, even when it cannot be
//! read.

use crate::application::ports::{DispatchError, Dispatcher};
use crate::domain::document::Submission;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Production endpoint for creating documents.
pub const DEFAULT_CREATE_URL: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Header carrying the detached signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Configuration for [`HttpDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpDispatcherConfig {
    /// Full URL of the create-document endpoint
    pub url: String,
    /// Per-request timeout, covering connect through reading the body
    pub timeout: Duration,
}

impl Default for HttpDispatcherConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CREATE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpDispatcherConfig {
    /// Point at a different endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Dispatcher that sends documents over HTTP.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Client,
    url: String,
}

impl HttpDispatcher {
    /// Build a dispatcher from its configuration.
    ///
    /// # Errors
    /// Returns the client construction error if the TLS backend cannot be
    /// initialized.
    pub fn new(config: HttpDispatcherConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config.url))
    }

    /// Reuse an existing `reqwest::Client`.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, submission: &Submission) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(submission.document())
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, submission.signature())
            .body(body)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // The status alone decides success; a body we cannot read is only noted
        match response.text().await {
            Ok(text) => debug!(
                doc_id = submission.doc_id(),
                status = status.as_u16(),
                response = %text,
                "document registered"
            ),
            Err(e) => debug!(
                doc_id = submission.doc_id(),
                status = status.as_u16(),
                error = %e,
                "document registered, response body unreadable"
            ),
        }
        Ok(())
    }
}
