//! Dot-product similarity ranking

use std::{fmt, str::FromStr};

use eventmatch_core::{Candidate, MatchError, MatchResult, Ranking, ScoredItem};
use ndarray::ArrayView1;
use tracing::{debug, warn};

/// Default acceptance threshold: keep every candidate with a positive score
pub const DEFAULT_THRESHOLD: f64 = 0.0;

/// What to do with a candidate whose embedding length differs from the reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Fail the whole request on the first mismatched candidate
    #[default]
    Abort,
    /// Drop the mismatched candidate, log it, and rank the rest
    Skip,
}

impl fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchPolicy::Abort => f.write_str("abort"),
            MismatchPolicy::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MismatchPolicy::Abort),
            "skip" => Ok(MismatchPolicy::Skip),
            other => Err(format!("unknown mismatch policy `{other}` (expected abort or skip)")),
        }
    }
}

/// Ranking knobs, fixed per deployment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingOptions {
    /// Candidates must score strictly above this value to be returned
    pub threshold: f64,
    pub mismatch_policy: MismatchPolicy,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            mismatch_policy: MismatchPolicy::Abort,
        }
    }
}

impl RankingOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }
}

/// Dot product of two embeddings
///
/// Embeddings from the provider are unit-norm, so this is their cosine
/// similarity in [-1, 1]. No renormalization happens here.
///
/// Accumulates in f64, so finite inputs always give a finite score.
/// Returns `None` when the lengths differ.
pub fn dot_product(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }

    let a_wide = ArrayView1::from(a).mapv(f64::from);
    let b_wide = ArrayView1::from(b).mapv(f64::from);

    Some(a_wide.dot(&b_wide))
}

/// Rank candidates against a reference embedding
///
/// Every candidate is scored independently; those scoring above
/// `options.threshold` are returned highest first. Equal scores keep their
/// input order. NaN scores never pass the threshold.
///
/// # Errors
/// * `InvalidInput` if the reference embedding is empty
/// * `DimensionMismatch` naming the first bad candidate, under
///   [`MismatchPolicy::Abort`]
pub fn rank(
    reference: &[f32],
    candidates: &[Candidate],
    options: &RankingOptions,
) -> MatchResult<Ranking> {
    if reference.is_empty() {
        return Err(MatchError::invalid_input("reference embedding must not be empty"));
    }

    debug!(
        "Ranking {} candidates, dimension={}, threshold={}, policy={}",
        candidates.len(),
        reference.len(),
        options.threshold,
        options.mismatch_policy
    );

    let mut skipped = Vec::new();
    let mut items = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let Some(score) = dot_product(reference, &candidate.embedding) else {
            match options.mismatch_policy {
                MismatchPolicy::Abort => {
                    return Err(MatchError::DimensionMismatch {
                        id: candidate.id.clone(),
                        expected: reference.len(),
                        actual: candidate.embedding.len(),
                    });
                }
                MismatchPolicy::Skip => {
                    warn!(
                        "Skipping event {}: dimension {} does not match {}",
                        candidate.id,
                        candidate.embedding.len(),
                        reference.len()
                    );
                    skipped.push(candidate.id.clone());
                    continue;
                }
            }
        };

        if score > options.threshold {
            items.push(ScoredItem {
                id: candidate.id.clone(),
                score,
            });
        }
    }

    // Stable sort, so ties keep input order
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(
        "Accepted {} of {} candidates ({} skipped)",
        items.len(),
        candidates.len(),
        skipped.len()
    );

    Ok(Ranking { items, skipped })
}
