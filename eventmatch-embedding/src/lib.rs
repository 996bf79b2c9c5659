//! Text Embeddings for Event Matching
//!
//! This crate turns free text into unit-norm embedding vectors using a local,
//! pretrained sentence-transformer model (via fastembed / ONNX runtime).
//!
//! ## Features
//! - One shared model instance, loaded once at startup
//! - Explicit readiness gate: calls fail with `NotReady` until loaded
//! - Mean-pooled, L2-normalized output, so dot product equals cosine similarity
//! - Serialized inference on a dedicated worker thread with per-call timeout

pub mod config;
pub mod extractor;
pub mod provider;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod vector;

pub use config::{EmbeddingConfig, ModelKind, UnknownModel};
pub use extractor::{FastEmbedExtractor, FeatureExtractor};
pub use provider::{EmbeddingProvider, ProviderStatus};
pub use vector::{l2_norm, normalize};
