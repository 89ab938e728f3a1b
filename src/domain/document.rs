//! Registration payload.
//!
//! Field names on the wire follow the remote endpoint's schema, which mixes
//! snake_case and camelCase (`importRequest`, `participantInn`). The serde
//! attributes below pin every name explicitly.

use serde::{Deserialize, Serialize};

/// Participant block nested under `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Taxpayer number of the participant
    #[serde(rename = "participantInn")]
    pub participant_inn: String,
}

/// One product line of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub certificate_document: String,
    pub certificate_document_date: String,
    pub certificate_document_number: String,
    pub owner_inn: String,
    pub producer_inn: String,
    pub production_date: String,
    pub tnved_code: String,
    pub uit_code: String,
    pub uitu_code: String,
}

/// Document submitted to the registration endpoint.
///
/// The limiter never inspects it; it is carried opaquely from the caller to
/// the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub description: Description,
    pub doc_id: String,
    pub doc_status: String,
    pub doc_type: String,
    #[serde(rename = "importRequest")]
    pub import_request: bool,
    pub owner_inn: String,
    pub participant_inn: String,
    pub producer_inn: String,
    pub production_date: String,
    pub production_type: String,
    pub products: Vec<Product>,
    pub reg_date: String,
    pub reg_number: String,
}

impl Document {
    /// Create an otherwise empty document with the given id.
    pub fn with_id(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            ..Self::default()
        }
    }
}

/// A document paired with its detached signature.
///
/// This is the unit of admission: one submission consumes one token and is
/// dispatched exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    document: Document,
    signature: String,
}

impl Submission {
    /// Pair a document with its signature.
    pub fn new(document: Document, signature: impl Into<String>) -> Self {
        Self {
            document,
            signature: signature.into(),
        }
    }

    /// The document payload.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The detached signature, sent alongside the document.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Id of the carried document, used in log fields.
    pub fn doc_id(&self) -> &str {
        &self.document.doc_id
    }

    /// Split back into document and signature.
    pub fn into_parts(self) -> (Document, String) {
        (self.document, self.signature)
    }
}
