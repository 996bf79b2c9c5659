//! Shared embedding provider
//!
//! The model lives on one dedicated worker thread and is reached through a
//! bounded job queue, so exactly one inference runs at a time and no request
//! ever touches model state directly. Until a model has been installed the
//! provider answers every call with `NotReady`.

use std::{
    sync::{Arc, OnceLock},
    thread,
    time::Duration,
};

use eventmatch_core::{MatchError, MatchResult, Vector};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::EmbeddingConfig,
    extractor::{FastEmbedExtractor, FeatureExtractor},
    vector::normalize,
};

/// Text run once at install time to discover the model's dimension
const WARMUP_TEXT: &str = "warm up";

/// Readiness as reported by health checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    Loading,
    Ready { model: String, dimension: usize },
}

/// One queued inference; the reply is dropped if the caller has gone away
struct EmbedJob {
    text: String,
    reply: oneshot::Sender<MatchResult<Vector>>,
}

/// Handle to the running worker, set once
struct ModelWorker {
    sender: mpsc::Sender<EmbedJob>,
    model: String,
    dimension: usize,
}

impl ModelWorker {
    async fn submit(
        &self,
        job: EmbedJob,
        response: oneshot::Receiver<MatchResult<Vector>>,
    ) -> MatchResult<Vector> {
        self.sender
            .send(job)
            .await
            .map_err(|_| MatchError::embedding_failure("embedding worker has stopped"))?;

        match response.await {
            Ok(result) => result,
            Err(_) => Err(MatchError::embedding_failure(
                "embedding worker dropped the request",
            )),
        }
    }
}

struct ProviderInner {
    worker: OnceLock<ModelWorker>,
    timeout: Duration,
    queue_depth: usize,
}

/// Cheaply cloneable handle to the single model instance
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: Arc<ProviderInner>,
}

impl EmbeddingProvider {
    /// Create a provider with no model yet
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                worker: OnceLock::new(),
                timeout: config.timeout,
                queue_depth: config.queue_depth.max(1),
            }),
        }
    }

    /// Load the configured fastembed model and install it
    ///
    /// Loading runs on a blocking thread. Any failure is `Fatal`: the caller
    /// is expected to stop serving.
    pub async fn load(&self, config: &EmbeddingConfig) -> MatchResult<()> {
        let provider = self.clone();
        let config = config.clone();

        tokio::task::spawn_blocking(move || {
            let extractor = FastEmbedExtractor::load(&config)
                .map_err(|e| MatchError::fatal(format!("{e:#}")))?;
            provider
                .install(extractor, config.model.as_str())
                .map(|_| ())
        })
        .await
        .map_err(|e| MatchError::fatal(format!("model loader task failed: {e}")))?
    }

    /// Install an extractor and start the worker thread
    ///
    /// Runs one warm-up inference to fix the dimension for the rest of the
    /// process. Blocking. Returns the dimension.
    pub fn install<E: FeatureExtractor>(
        &self,
        mut extractor: E,
        model: impl Into<String>,
    ) -> MatchResult<usize> {
        let model = model.into();
        if self.is_ready() {
            return Err(MatchError::fatal("embedding model is already initialized"));
        }

        let dimension = extractor
            .extract(WARMUP_TEXT)
            .map_err(|e| MatchError::fatal(format!("warm-up inference failed: {e:#}")))?
            .len();
        if dimension == 0 {
            return Err(MatchError::fatal("model produced an empty embedding"));
        }

        let (sender, receiver) = mpsc::channel(self.inner.queue_depth);
        thread::Builder::new()
            .name("embedding-worker".to_string())
            .spawn(move || run_worker(extractor, receiver, dimension))
            .map_err(|e| MatchError::fatal(format!("failed to start embedding worker: {e}")))?;

        let worker = ModelWorker {
            sender,
            model: model.clone(),
            dimension,
        };
        // A racing install loses here; dropping its sender stops its worker.
        if self.inner.worker.set(worker).is_err() {
            return Err(MatchError::fatal("embedding model is already initialized"));
        }

        info!("Embedding model ready: model={}, dimension={}", model, dimension);
        Ok(dimension)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.worker.get().is_some()
    }

    /// Embedding dimension, known once the model is ready
    pub fn dimension(&self) -> Option<usize> {
        self.inner.worker.get().map(|w| w.dimension)
    }

    pub fn status(&self) -> ProviderStatus {
        match self.inner.worker.get() {
            Some(worker) => ProviderStatus::Ready {
                model: worker.model.clone(),
                dimension: worker.dimension,
            },
            None => ProviderStatus::Loading,
        }
    }

    /// Embed `text` into a unit-norm vector
    ///
    /// # Errors
    /// * `NotReady` while the model is loading
    /// * `InvalidInput` for empty or whitespace-only text
    /// * `EmbeddingFailure` if inference fails or times out
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn embed(&self, text: &str) -> MatchResult<Vector> {
        let worker = self.inner.worker.get().ok_or(MatchError::NotReady)?;

        if text.trim().is_empty() {
            return Err(MatchError::invalid_input("Text is required"));
        }

        let (reply, response) = oneshot::channel();
        let job = EmbedJob {
            text: text.to_string(),
            reply,
        };

        match tokio::time::timeout(self.inner.timeout, worker.submit(job, response)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Embedding timed out after {:?}", self.inner.timeout);
                Err(MatchError::embedding_failure(format!(
                    "timed out after {:?}",
                    self.inner.timeout
                )))
            }
        }
    }
}

/// Worker loop: owns the extractor for its whole life
fn run_worker<E: FeatureExtractor>(
    mut extractor: E,
    mut receiver: mpsc::Receiver<EmbedJob>,
    dimension: usize,
) {
    debug!("Embedding worker started");

    while let Some(job) = receiver.blocking_recv() {
        if job.reply.is_closed() {
            debug!("Skipping abandoned embedding request");
            continue;
        }

        let result = embed_one(&mut extractor, &job.text, dimension);
        if job.reply.send(result).is_err() {
            debug!("Caller went away before the embedding was ready");
        }
    }

    debug!("Embedding worker stopped");
}

fn embed_one<E: FeatureExtractor>(
    extractor: &mut E,
    text: &str,
    dimension: usize,
) -> MatchResult<Vector> {
    let raw = extractor.extract(text).map_err(|e| {
        error!("Error generating embeddings: {e:#}");
        MatchError::embedding_failure(e.to_string())
    })?;

    if raw.len() != dimension {
        error!(
            "Model returned dimension {}, expected {}",
            raw.len(),
            dimension
        );
        return Err(MatchError::embedding_failure(format!(
            "model returned dimension {}, expected {dimension}",
            raw.len()
        )));
    }

    normalize(raw).ok_or_else(|| {
        error!("Model returned a vector that cannot be normalized");
        MatchError::embedding_failure("model returned a zero or non-finite vector")
    })
}

#[cfg(test)]
mod tests {
    use eventmatch_core::ErrorKind;

    use super::*;
    use crate::{
        testing::{FailingExtractor, FixedExtractor, HashingExtractor},
        vector::l2_norm,
    };

    fn provider() -> EmbeddingProvider {
        EmbeddingProvider::new(&EmbeddingConfig::default())
    }

    #[tokio::test]
    async fn test_not_ready_before_install() {
        let provider = provider();

        assert!(!provider.is_ready());
        assert_eq!(provider.status(), ProviderStatus::Loading);
        assert_eq!(provider.dimension(), None);

        let err = provider.embed("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
    }

    #[tokio::test]
    async fn test_ready_after_install() {
        let provider = provider();
        let dimension = provider.install(HashingExtractor::new(16), "hashing").unwrap();

        assert_eq!(dimension, 16);
        assert!(provider.is_ready());
        assert_eq!(
            provider.status(),
            ProviderStatus::Ready {
                model: "hashing".to_string(),
                dimension: 16
            }
        );

        let embedding = provider.embed("hello world").await.unwrap();
        assert_eq!(embedding.len(), 16);
    }

    #[tokio::test]
    async fn test_clones_share_readiness() {
        let provider = provider();
        let handle = provider.clone();

        provider.install(HashingExtractor::new(8), "hashing").unwrap();

        assert!(handle.is_ready());
        assert!(handle.embed("shared").await.is_ok());
    }

    #[tokio::test]
    async fn test_embeddings_are_unit_norm() {
        let provider = provider();
        provider.install(HashingExtractor::new(32), "hashing").unwrap();

        for text in [
            "a",
            "Rooftop cinema: classic films under the stars",
            "  padded text  ",
            "repeat repeat repeat repeat",
        ] {
            let embedding = provider.embed(text).await.unwrap();
            assert!(
                (l2_norm(&embedding) - 1.0).abs() < 1e-6,
                "norm of {text:?} embedding is {}",
                l2_norm(&embedding)
            );
        }
    }

    #[tokio::test]
    async fn test_embed_is_deterministic() {
        let provider = provider();
        provider.install(HashingExtractor::new(32), "hashing").unwrap();

        let first = provider.embed("farmers market").await.unwrap();
        let second = provider.embed("farmers market").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let provider = provider();
        provider.install(HashingExtractor::new(8), "hashing").unwrap();

        for text in ["", "   ", "\n\t"] {
            let err = provider.embed(text).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn test_inference_failure_is_embedding_failure() {
        let provider = provider();
        provider.install(FailingExtractor::after_warmup(4), "failing").unwrap();

        let err = provider.embed("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingFailure);
    }

    #[tokio::test]
    async fn test_zero_vector_is_embedding_failure() {
        let provider = provider();
        provider.install(FixedExtractor(vec![0.0; 4]), "zero").unwrap();

        let err = provider.embed("anything").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingFailure);
    }

    #[test]
    fn test_failed_warmup_is_fatal() {
        let provider = provider();

        let err = provider.install(FailingExtractor::always(), "broken").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fatal);
        assert!(!provider.is_ready());
    }

    #[tokio::test]
    async fn test_second_install_rejected() {
        let provider = provider();
        provider.install(HashingExtractor::new(8), "first").unwrap();

        let err = provider.install(HashingExtractor::new(4), "second").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fatal);
        assert_eq!(provider.dimension(), Some(8));
    }

    #[tokio::test]
    async fn test_timeout_leaves_worker_usable() {
        let config = EmbeddingConfig {
            timeout: Duration::from_millis(50),
            ..EmbeddingConfig::default()
        };
        let provider = EmbeddingProvider::new(&config);
        provider
            .install(
                HashingExtractor::new(8).with_delay(Duration::from_millis(200)),
                "slow",
            )
            .unwrap();

        let err = provider.embed("too slow").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmbeddingFailure);

        // Let the worker finish the abandoned job
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Same worker without the deadline: the abandoned job did not poison it
        let worker = provider.inner.worker.get().unwrap();
        let (reply, response) = oneshot::channel();
        let job = EmbedJob {
            text: "second try".to_string(),
            reply,
        };
        let embedding = worker.submit(job, response).await.unwrap();
        assert!((l2_norm(&embedding) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_concurrent_requests_all_answered() {
        let provider = provider();
        provider.install(HashingExtractor::new(16), "hashing").unwrap();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.embed(&format!("event number {i}")).await })
            })
            .collect();

        for handle in handles {
            let embedding = handle.await.unwrap().unwrap();
            assert_eq!(embedding.len(), 16);
        }
    }
}
