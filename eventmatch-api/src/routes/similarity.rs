//! Event similarity ranking endpoint

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use eventmatch_core::{Candidate, ItemId, MatchError, MatchResult, Vector};
use eventmatch_ranking::rank;
use serde::Deserialize;
use tracing::info;

use crate::{error::ApiError, AppState};

/// An embedding as it appears on the wire
///
/// Clients usually send the JSON text of the array (as stored next to their
/// events); a plain array is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireEmbedding {
    Encoded(String),
    Native(Vec<f32>),
}

impl WireEmbedding {
    /// An empty encoded string counts as absent
    fn is_blank(&self) -> bool {
        matches!(self, WireEmbedding::Encoded(json) if json.trim().is_empty())
    }

    /// Decode into a vector, rejecting non-finite components
    pub fn decode(self, id: Option<&ItemId>) -> MatchResult<Vector> {
        let vector = match self {
            WireEmbedding::Encoded(json) => serde_json::from_str::<Vec<f32>>(&json)
                .map_err(|e| MatchError::malformed_embedding(id.cloned(), e.to_string()))?,
            WireEmbedding::Native(vector) => vector,
        };

        if vector.iter().any(|x| !x.is_finite()) {
            return Err(MatchError::malformed_embedding(
                id.cloned(),
                "embedding contains a non-finite value",
            ));
        }
        Ok(vector)
    }
}

#[derive(Debug, Deserialize)]
pub struct EventPayload {
    pub id: Option<ItemId>,
    pub embedding: Option<WireEmbedding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityRequest {
    pub user_embedding: Option<WireEmbedding>,
    pub events: Option<Vec<EventPayload>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SimilarityQuery {
    /// Return `[{id, score}]` instead of bare ids
    #[serde(default)]
    pub scores: bool,
}

/// Create similarity routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/similarity", post(similarity))
}

/// POST /similarity - Rank events by similarity to the user embedding
///
/// Responds with event ids, most similar first, filtered by the configured
/// acceptance threshold.
async fn similarity(
    State(state): State<AppState>,
    query: Result<Query<SimilarityQuery>, QueryRejection>,
    payload: Result<Json<SimilarityRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let Json(request) = payload?;

    let user_embedding = request.user_embedding.filter(|e| !e.is_blank());
    let (Some(user_embedding), Some(events)) = (user_embedding, request.events) else {
        return Err(MatchError::invalid_input("userEmbedding and events are required").into());
    };

    let (reference, candidates) = decode_request(user_embedding, events)?;
    let ranking = rank(&reference, &candidates, &state.ranking)?;

    info!(
        "Ranked {} events: {} accepted, {} skipped",
        candidates.len(),
        ranking.len(),
        ranking.skipped.len()
    );

    if query.scores {
        Ok(Json(ranking.items).into_response())
    } else {
        Ok(Json(ranking.into_ids()).into_response())
    }
}

/// Check required fields first, then decode embeddings
fn decode_request(
    user_embedding: WireEmbedding,
    events: Vec<EventPayload>,
) -> MatchResult<(Vector, Vec<Candidate>)> {
    let mut pending = Vec::with_capacity(events.len());
    for (index, mut event) in events.into_iter().enumerate() {
        event.embedding = event.embedding.filter(|e| !e.is_blank());
        match event {
            EventPayload {
                id: Some(id),
                embedding: Some(embedding),
            } => pending.push((id, embedding)),
            EventPayload { id: None, .. } => {
                return Err(MatchError::invalid_input(format!(
                    "events[{index}].id is required"
                )))
            }
            EventPayload { embedding: None, .. } => {
                return Err(MatchError::invalid_input(format!(
                    "events[{index}].embedding is required"
                )))
            }
        }
    }

    let reference = user_embedding.decode(None)?;
    let candidates = pending
        .into_iter()
        .map(|(id, embedding)| {
            let embedding = embedding.decode(Some(&id))?;
            Ok(Candidate { id, embedding })
        })
        .collect::<MatchResult<Vec<_>>>()?;

    Ok((reference, candidates))
}
