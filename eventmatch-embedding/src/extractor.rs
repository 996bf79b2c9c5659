//! Feature-extraction backends
//!
//! A [`FeatureExtractor`] turns text into one pooled vector. The provider owns
//! exactly one extractor and only ever calls it from its worker thread, so
//! implementations get `&mut self` and need not be `Sync`.

use anyhow::{Context, anyhow};
use fastembed::{InitOptions, TextEmbedding};
use tracing::{info, instrument};

use crate::config::EmbeddingConfig;

/// Text to pooled (not necessarily normalized) feature vector
pub trait FeatureExtractor: Send + 'static {
    fn extract(&mut self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// ONNX sentence-transformer model run locally through fastembed
///
/// Token outputs are mean pooled by fastembed for the supported models.
pub struct FastEmbedExtractor {
    model: TextEmbedding,
}

impl FastEmbedExtractor {
    /// Load (downloading on first use) the configured model
    ///
    /// Blocking: call from a blocking thread.
    #[instrument(skip(config), fields(model = %config.model))]
    pub fn load(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        info!("Loading the feature extraction model...");

        let mut options = InitOptions::new(config.model.fastembed_model())
            .with_show_download_progress(config.show_download_progress);
        if let Some(dir) = &config.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        let model = TextEmbedding::try_new(options)
            .with_context(|| format!("failed to initialize {}", config.model))?;

        info!("Model loaded successfully");
        Ok(Self { model })
    }
}

impl FeatureExtractor for FastEmbedExtractor {
    fn extract(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut output = self.model.embed(vec![text], None)?;
        output
            .pop()
            .ok_or_else(|| anyhow!("model returned no embedding"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::l2_norm;

    #[test]
    #[ignore] // Downloads the model
    fn test_fastembed_default_model() {
        let mut extractor =
            FastEmbedExtractor::load(&EmbeddingConfig::default()).expect("Failed to load model");

        let embedding = extractor
            .extract("Live jazz night at the riverside pavilion")
            .expect("Failed to extract features");

        assert_eq!(embedding.len(), 384);
        assert!(l2_norm(&embedding) > 0.0);
    }
}
