//! Text embedding endpoint

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use eventmatch_core::MatchError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<f32>,
    pub size: usize,
}

/// Create embedding routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/embed", post(embed))
}

/// POST /embed - Embed `text` into a unit-norm vector
///
/// Callers persist the vector themselves (e.g. alongside the event) and send
/// it back later to /similarity.
async fn embed(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    // Readiness is reported before payload problems
    if !state.provider.is_ready() {
        return Err(MatchError::NotReady.into());
    }

    let Json(request) = payload?;
    let text = request
        .text
        .ok_or_else(|| MatchError::invalid_input("Text is required"))?;

    let embeddings = state.provider.embed(&text).await?;
    debug!("Embedded {} chars into {} dimensions", text.len(), embeddings.len());

    Ok(Json(EmbedResponse {
        size: embeddings.len(),
        embeddings,
    }))
}
