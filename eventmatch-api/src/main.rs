//! Event Matching API Server
//!
//! Serves text embeddings and embedding similarity ranking over HTTP.

use std::future::IntoFuture;

use eventmatch_api::{app, AppState, ServerConfig};
use eventmatch_embedding::EmbeddingProvider;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,eventmatch_api=debug")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        "Starting event matching API (model={}, threshold={}, mismatch_policy={})",
        config.embedding.model, config.ranking.threshold, config.ranking.mismatch_policy
    );

    // The provider starts out loading; requests get 503 until the model is in
    let provider = EmbeddingProvider::new(&config.embedding);
    let state = AppState::new(provider.clone(), config.ranking);

    // Load the model in the background; a failure stops the server
    let (fatal_tx, fatal_rx) = oneshot::channel();
    let embedding_config = config.embedding.clone();
    tokio::spawn(async move {
        if let Err(e) = provider.load(&embedding_config).await {
            error!("Error loading model: {}", e);
            let _ = fatal_tx.send(e);
        }
    });

    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    info!("Server is running on {}", config.public_url);

    let server = axum::serve(listener, app(state, config.body_limit))
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    tokio::select! {
        result = server => result?,
        Ok(fatal) = fatal_rx => return Err(fatal.into()),
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
