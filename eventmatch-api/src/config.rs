//! Server configuration from environment variables

use std::{
    env,
    fmt::Display,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use eventmatch_embedding::{EmbeddingConfig, ModelKind};
use eventmatch_ranking::{MismatchPolicy, RankingOptions};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SERVER_URL: &str = "http://localhost";
/// 10 MiB, the JSON body limit clients of this service expect
const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Public URL, only used for the startup log line
    pub public_url: String,
    /// Max request body size in bytes
    pub body_limit: usize,
    pub ranking: RankingOptions,
    pub embedding: EmbeddingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            public_url: format!("{DEFAULT_SERVER_URL}:{DEFAULT_PORT}"),
            body_limit: DEFAULT_BODY_LIMIT,
            ranking: RankingOptions::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// Reads:
    /// - EMBED_PORT, EMBED_HOST: listen address
    /// - EMBED_SERVER_URL, SERVER_URL: public URL for logging
    /// - EMBED_MODEL, EMBED_MODEL_CACHE_DIR: model selection
    /// - EMBED_SIMILARITY_THRESHOLD, EMBED_MISMATCH_POLICY: ranking policy
    /// - EMBED_TIMEOUT_SECS, EMBED_QUEUE_DEPTH: inference limits
    /// - EMBED_BODY_LIMIT_BYTES: request body limit
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var(&lookup, "EMBED_PORT", defaults.port)?;
        let host = parse_var(&lookup, "EMBED_HOST", defaults.host)?;

        let public_url = match lookup("SERVER_URL") {
            Some(url) => url,
            None => {
                let base = lookup("EMBED_SERVER_URL")
                    .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
                format!("{base}:{port}")
            }
        };

        let body_limit = parse_var(&lookup, "EMBED_BODY_LIMIT_BYTES", defaults.body_limit)?;
        if body_limit == 0 {
            return Err(ConfigError::invalid("EMBED_BODY_LIMIT_BYTES", "must be positive"));
        }

        let threshold: f64 =
            parse_var(&lookup, "EMBED_SIMILARITY_THRESHOLD", defaults.ranking.threshold)?;
        if !threshold.is_finite() {
            return Err(ConfigError::invalid(
                "EMBED_SIMILARITY_THRESHOLD",
                "must be a finite number",
            ));
        }
        let mismatch_policy: MismatchPolicy = parse_var(
            &lookup,
            "EMBED_MISMATCH_POLICY",
            defaults.ranking.mismatch_policy,
        )?;

        let model: ModelKind = parse_var(&lookup, "EMBED_MODEL", defaults.embedding.model)?;
        let cache_dir = lookup("EMBED_MODEL_CACHE_DIR").map(PathBuf::from);

        let timeout_secs: u64 = parse_var(
            &lookup,
            "EMBED_TIMEOUT_SECS",
            defaults.embedding.timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("EMBED_TIMEOUT_SECS", "must be positive"));
        }

        let queue_depth = parse_var(&lookup, "EMBED_QUEUE_DEPTH", defaults.embedding.queue_depth)?;
        if queue_depth == 0 {
            return Err(ConfigError::invalid("EMBED_QUEUE_DEPTH", "must be positive"));
        }

        Ok(Self {
            host,
            port,
            public_url,
            body_limit,
            ranking: RankingOptions {
                threshold,
                mismatch_policy,
            },
            embedding: EmbeddingConfig {
                model,
                cache_dir,
                timeout: Duration::from_secs(timeout_secs),
                queue_depth,
                ..defaults.embedding
            },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
        _ => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
