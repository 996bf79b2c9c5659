//! Embedding provider configuration

use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use fastembed::EmbeddingModel;
use thiserror::Error;

/// Max time a caller waits for one inference, queueing included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Jobs allowed to wait for the worker before callers are back-pressured
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Mean-pooled sentence-transformer models the provider can load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelKind {
    /// sentence-transformers/all-MiniLM-L6-v2 (384 dimensions)
    #[default]
    AllMiniLmL6V2,
    /// sentence-transformers/all-MiniLM-L12-v2 (384 dimensions)
    AllMiniLmL12V2,
    /// sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2 (384 dimensions)
    ParaphraseMultilingualMiniLmL12V2,
    /// intfloat/multilingual-e5-small (384 dimensions)
    MultilingualE5Small,
    /// intfloat/multilingual-e5-large (1024 dimensions)
    MultilingualE5Large,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::AllMiniLmL6V2,
        ModelKind::AllMiniLmL12V2,
        ModelKind::ParaphraseMultilingualMiniLmL12V2,
        ModelKind::MultilingualE5Small,
        ModelKind::MultilingualE5Large,
    ];

    /// Name used in configuration and logs
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::AllMiniLmL6V2 => "all-minilm-l6-v2",
            ModelKind::AllMiniLmL12V2 => "all-minilm-l12-v2",
            ModelKind::ParaphraseMultilingualMiniLmL12V2 => "paraphrase-multilingual-minilm-l12-v2",
            ModelKind::MultilingualE5Small => "multilingual-e5-small",
            ModelKind::MultilingualE5Large => "multilingual-e5-large",
        }
    }

    pub(crate) fn fastembed_model(self) -> EmbeddingModel {
        match self {
            ModelKind::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            ModelKind::AllMiniLmL12V2 => EmbeddingModel::AllMiniLML12V2,
            ModelKind::ParaphraseMultilingualMiniLmL12V2 => EmbeddingModel::ParaphraseMLMiniLML12V2,
            ModelKind::MultilingualE5Small => EmbeddingModel::MultilingualE5Small,
            ModelKind::MultilingualE5Large => EmbeddingModel::MultilingualE5Large,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown embedding model `{0}`")]
pub struct UnknownModel(pub String);

impl FromStr for ModelKind {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        // Accept Hugging Face ids too, e.g. Xenova/all-MiniLM-L6-v2
        let wanted = wanted.rsplit('/').next().unwrap_or_default();

        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

/// Settings for loading and serving the model
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub model: ModelKind,
    /// Where fastembed keeps downloaded model files (fastembed's default if unset)
    pub cache_dir: Option<PathBuf>,
    pub show_download_progress: bool,
    pub timeout: Duration,
    pub queue_depth: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            cache_dir: None,
            show_download_progress: false,
            timeout: DEFAULT_TIMEOUT,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_names() {
        assert_eq!("all-minilm-l6-v2".parse(), Ok(ModelKind::AllMiniLmL6V2));
        assert_eq!("Xenova/all-MiniLM-L6-v2".parse(), Ok(ModelKind::AllMiniLmL6V2));
        assert_eq!(
            "intfloat/multilingual-e5-large".parse(),
            Ok(ModelKind::MultilingualE5Large)
        );
        assert_eq!(
            "bge-small-en".parse::<ModelKind>(),
            Err(UnknownModel("bge-small-en".to_string()))
        );
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model, ModelKind::AllMiniLmL6V2);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.queue_depth, 64);
        assert!(config.cache_dir.is_none());
    }
}
