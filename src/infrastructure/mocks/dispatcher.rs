//! Mock dispatcher for testing.

use crate::application::ports::{DispatchError, Dispatcher};
use crate::domain::document::Submission;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Dispatcher that records every delivered submission in order.
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to the limiter.
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    record: Arc<Mutex<Record>>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Record {
    delivered: Vec<Submission>,
    failing: HashSet<String>,
    attempts: usize,
}

impl RecordingDispatcher {
    /// Create a dispatcher that accepts everything instantly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` (on the tokio clock) before every dispatch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every dispatch of the document with this id fail.
    pub fn fail_doc(&self, doc_id: impl Into<String>) {
        self.lock().failing.insert(doc_id.into());
    }

    /// Successfully delivered submissions, in delivery order.
    pub fn delivered(&self) -> Vec<Submission> {
        self.lock().delivered.clone()
    }

    /// Document ids of delivered submissions, in delivery order.
    pub fn delivered_ids(&self) -> Vec<String> {
        self.lock()
            .delivered
            .iter()
            .map(|submission| submission.doc_id().to_string())
            .collect()
    }

    /// Number of successful deliveries.
    pub fn count(&self) -> usize {
        self.lock().delivered.len()
    }

    /// Number of dispatch calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Forget everything delivered so far.
    pub fn clear(&self) {
        let mut record = self.lock();
        record.delivered.clear();
        record.attempts = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().expect(
            "RecordingDispatcher mutex poisoned - a test thread panicked while holding the lock",
        )
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        let record = Arc::clone(&self.record);
        let submission = submission.clone();
        let delay = self.delay;

        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut record = record.lock().expect(
                "RecordingDispatcher mutex poisoned - a test thread panicked while holding the lock",
            );
            record.attempts += 1;
            if record.failing.contains(submission.doc_id()) {
                return Err(DispatchError::Rejected(format!(
                    "document {} refused",
                    submission.doc_id()
                )));
            }
            record.delivered.push(submission);
            Ok(())
        }
    }
}
