//! Error taxonomy for the matching service

use serde::Serialize;
use thiserror::Error;

use crate::types::ItemId;

/// Coarse error classification exposed to callers
///
/// Every failure is mapped to exactly one kind before it leaves a component,
/// so callers can tell "retry later" apart from "fix your request".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed required fields
    InvalidInput,
    /// Model resource still loading
    NotReady,
    /// Candidate vector length disagrees with the reference
    DimensionMismatch,
    /// Model inference failed
    EmbeddingFailure,
    /// Model resource failed to initialize (startup only)
    Fatal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::EmbeddingFailure => "embedding_failure",
            ErrorKind::Fatal => "fatal",
        }
    }

    /// Whether the same request may succeed if sent again later
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::NotReady | ErrorKind::EmbeddingFailure)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-wide error type
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Malformed embedding{}: {reason}", event_suffix(.id))]
    MalformedEmbedding { id: Option<ItemId>, reason: String },

    #[error("Model is loading, please try again later")]
    NotReady,

    #[error("Event {id} has embedding dimension {actual}, expected {expected}")]
    DimensionMismatch {
        id: ItemId,
        expected: usize,
        actual: usize,
    },

    #[error("Error generating embeddings: {0}")]
    EmbeddingFailure(String),

    #[error("Model initialization failed: {0}")]
    Fatal(String),
}

impl MatchError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        MatchError::InvalidInput(msg.into())
    }

    pub fn malformed_embedding(id: Option<ItemId>, reason: impl Into<String>) -> Self {
        MatchError::MalformedEmbedding {
            id,
            reason: reason.into(),
        }
    }

    pub fn embedding_failure(msg: impl Into<String>) -> Self {
        MatchError::EmbeddingFailure(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        MatchError::Fatal(msg.into())
    }

    /// The taxonomy bucket this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::InvalidInput(_)
            | MatchError::PayloadTooLarge(_)
            | MatchError::MalformedEmbedding { .. } => ErrorKind::InvalidInput,
            MatchError::NotReady => ErrorKind::NotReady,
            MatchError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            MatchError::EmbeddingFailure(_) => ErrorKind::EmbeddingFailure,
            MatchError::Fatal(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

fn event_suffix(id: &Option<ItemId>) -> String {
    id.as_ref()
        .map(|id| format!(" for event {id}"))
        .unwrap_or_default()
}

/// Result type alias for matching operations
pub type MatchResult<T> = Result<T, MatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(MatchError::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(
            MatchError::malformed_embedding(None, "bad").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            MatchError::PayloadTooLarge("length limit exceeded".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(MatchError::NotReady.kind(), ErrorKind::NotReady);
        assert_eq!(
            MatchError::embedding_failure("boom").kind(),
            ErrorKind::EmbeddingFailure
        );
        assert_eq!(MatchError::fatal("gone").kind(), ErrorKind::Fatal);
    }

    #[test]
    fn test_retryable() {
        assert!(MatchError::NotReady.is_retryable());
        assert!(MatchError::embedding_failure("boom").is_retryable());
        assert!(!MatchError::invalid_input("x").is_retryable());
        assert!(!MatchError::DimensionMismatch {
            id: ItemId::from("a"),
            expected: 2,
            actual: 3,
        }
        .is_retryable());
    }

    #[test]
    fn test_dimension_mismatch_names_candidate() {
        let err = MatchError::DimensionMismatch {
            id: ItemId::from("evt-7"),
            expected: 384,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Event evt-7 has embedding dimension 3, expected 384"
        );
    }

    #[test]
    fn test_malformed_embedding_message() {
        let err = MatchError::malformed_embedding(Some(ItemId::from(12_i64)), "expected `[`");
        assert_eq!(err.to_string(), "Malformed embedding for event 12: expected `[`");

        let err = MatchError::malformed_embedding(None, "EOF");
        assert_eq!(err.to_string(), "Malformed embedding: EOF");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::DimensionMismatch).unwrap();
        assert_eq!(json, "\"dimension_mismatch\"");
        assert_eq!(ErrorKind::NotReady.to_string(), "not_ready");
    }
}
