//! Shared helpers for integration tests.

#![allow(dead_code)]

use doc_throttle::{DispatchError, Dispatcher, Document, Submission};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Dispatcher that remembers the order in which documents went out.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, doc_id: &str) {
        self.failing.lock().unwrap().insert(doc_id.to_string());
    }

    pub fn slow(&self, doc_id: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(doc_id.to_string(), delay);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Dispatcher for Recorder {
    async fn dispatch(&self, submission: &Submission) -> Result<(), DispatchError> {
        let delay = self.delays.lock().unwrap().get(submission.doc_id()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(submission.doc_id()) {
            return Err(DispatchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push(submission.doc_id().to_string());
        Ok(())
    }
}

pub fn document(id: impl Into<String>) -> Document {
    Document::with_id(id)
}

pub fn ids(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{}{}", prefix, i)).collect()
}
