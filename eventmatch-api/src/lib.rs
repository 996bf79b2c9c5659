//! Event Matching API Server
//!
//! HTTP surface over the embedding provider and the similarity ranking engine.

pub mod config;
pub mod error;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    Router,
};
use eventmatch_embedding::EmbeddingProvider;
use eventmatch_ranking::RankingOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::{ConfigError, ServerConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the single model instance (may still be loading)
    pub provider: EmbeddingProvider,
    pub ranking: RankingOptions,
}

impl AppState {
    pub fn new(provider: EmbeddingProvider, ranking: RankingOptions) -> Self {
        Self { provider, ranking }
    }
}

/// Build the router with CORS, tracing and the request body limit applied
pub fn app(state: AppState, body_limit: usize) -> Router {
    // Configure CORS for browser clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
