//! Similarity Ranking for Event Recommendations
//!
//! Scores a batch of precomputed event embeddings against one user embedding
//! and returns the events in descending order of similarity.
//!
//! ## Features
//! - Dot-product similarity (cosine similarity for unit-norm embeddings)
//! - Configurable acceptance threshold
//! - Stable ordering for equal scores
//! - Explicit policy for candidates with the wrong dimension

pub mod similarity;

pub use similarity::{DEFAULT_THRESHOLD, MismatchPolicy, RankingOptions, dot_product, rank};
