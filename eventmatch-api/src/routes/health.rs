//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use eventmatch_embedding::ProviderStatus;

use crate::AppState;

/// Readiness check: 200 once the model is loaded, 503 while loading
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ProviderStatus>) {
    let status = state.provider.status();

    let code = match status {
        ProviderStatus::Ready { .. } => StatusCode::OK,
        ProviderStatus::Loading => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(status))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

async fn root() -> &'static str {
    "Hello World"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
