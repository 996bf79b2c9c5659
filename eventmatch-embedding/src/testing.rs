//! In-process extractors for tests

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    thread,
    time::Duration,
};

use anyhow::bail;

use crate::extractor::FeatureExtractor;

/// Deterministic bag-of-words extractor
///
/// Each lowercase token bumps one hashed bucket, so texts sharing words get
/// similar vectors. Output is deliberately not normalized.
#[derive(Debug, Clone)]
pub struct HashingExtractor {
    dimension: usize,
    delay: Duration,
}

impl HashingExtractor {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long on every call, to simulate a slow model
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl FeatureExtractor for HashingExtractor {
    fn extract(&mut self, text: &str) -> anyhow::Result<Vec<f32>> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        if self.dimension == 0 {
            bail!("hashing extractor needs a non-zero dimension");
        }

        let mut features = vec![0.0_f32; self.dimension];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            features[bucket] += 1.0;
        }
        Ok(features)
    }
}

/// Extractor that answers `healthy_calls` times and then fails every call
#[derive(Debug, Clone)]
pub struct FailingExtractor {
    dimension: usize,
    healthy_calls: usize,
}

impl FailingExtractor {
    /// Fails from the first call, so the provider never becomes ready
    pub fn always() -> Self {
        Self {
            dimension: 0,
            healthy_calls: 0,
        }
    }

    /// Survives the warm-up inference, then fails
    pub fn after_warmup(dimension: usize) -> Self {
        Self {
            dimension,
            healthy_calls: 1,
        }
    }
}

impl FeatureExtractor for FailingExtractor {
    fn extract(&mut self, _text: &str) -> anyhow::Result<Vec<f32>> {
        if self.healthy_calls == 0 {
            bail!("onnx session crashed");
        }
        self.healthy_calls -= 1;
        Ok(vec![1.0; self.dimension])
    }
}

/// Extractor that always returns the same raw vector
#[derive(Debug, Clone)]
pub struct FixedExtractor(pub Vec<f32>);

impl FeatureExtractor for FixedExtractor {
    fn extract(&mut self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.0.clone())
    }
}
