//! API route definitions

mod embed;
mod health;
mod similarity;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(embed::routes())
        .merge(similarity::routes())
}
