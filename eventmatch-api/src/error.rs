//! Mapping of service errors onto HTTP responses

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventmatch_core::{ErrorKind, MatchError};
use serde::Serialize;
use tracing::{debug, error};

/// Error body: human readable message plus the taxonomy kind
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: ErrorKind,
}

/// A [`MatchError`] on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub MatchError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MatchError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MatchError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            MatchError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            // Embedding payloads that do not parse, or do not line up, are
            // reported as 500 like every other similarity computation failure
            MatchError::MalformedEmbedding { .. }
            | MatchError::DimensionMismatch { .. }
            | MatchError::EmbeddingFailure(_)
            | MatchError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Keep 413 from the body limit; every other body problem is a 400
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError(MatchError::PayloadTooLarge(rejection.body_text()))
        } else {
            ApiError(MatchError::invalid_input(rejection.body_text()))
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(MatchError::invalid_input(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", self.0.kind(), self.0);
        } else {
            debug!("Request rejected ({}): {}", self.0.kind(), self.0);
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use eventmatch_core::ItemId;

    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (MatchError::invalid_input("Text is required"), StatusCode::BAD_REQUEST),
            (
                MatchError::PayloadTooLarge("length limit exceeded".into()),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (MatchError::NotReady, StatusCode::SERVICE_UNAVAILABLE),
            (
                MatchError::malformed_embedding(None, "EOF"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                MatchError::DimensionMismatch {
                    id: ItemId::from("a"),
                    expected: 2,
                    actual: 3,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                MatchError::embedding_failure("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
