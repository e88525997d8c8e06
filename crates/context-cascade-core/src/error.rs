//! Error taxonomy for context resolution.
//!
//! None of these are fatal to a full cascade run: each state maps its
//! failures onto "no context from this state" and the next state runs.

use thiserror::Error;

/// Errors raised by individual retrieval operations.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A document or episode reference resolved to nothing.
    #[error("no document matches {reference}")]
    NotFound { reference: String },

    /// A document could not be read.
    #[error("failed to read document {name}: {reason}")]
    IoFailure { name: String, reason: String },

    /// The embedding or vector-search service failed or timed out.
    #[error("external service failure: {0}")]
    ExternalService(String),

    /// The query could not be interpreted.
    #[error("malformed query: {0:?}")]
    MalformedQuery(String),
}

impl RetrievalError {
    pub fn not_found(reference: impl Into<String>) -> Self {
        RetrievalError::NotFound {
            reference: reference.into(),
        }
    }
}
