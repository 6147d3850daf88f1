//! Deterministic digest embedding
//!
//! The SHA-256 digest of the text gives 64 nibbles (high nibble first).
//! They are repeated cyclically up to the requested dimension, each mapped
//! linearly from `0..=15` into `[-1, 1]`, and the vector is L2-normalized.
//! No nibble maps to zero, so the result always has unit norm.

use async_trait::async_trait;
use aura_domain::Result;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;

const MODEL_ID: &str = "sha256-digest";

/// Fallback embedding for `text` with `dimension` components.
pub fn fallback_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let nibbles: Vec<u8> = digest.iter().flat_map(|byte| [byte >> 4, byte & 0x0f]).collect();

    let mut vector: Vec<f32> = nibbles
        .iter()
        .cycle()
        .take(dimension)
        .map(|&nibble| f32::from(nibble) / 15.0 * 2.0 - 1.0)
        .collect();
    l2_normalize(&mut vector);
    vector
}

/// Scale to unit length. Returns false (leaving the vector untouched) when
/// the norm is zero or not finite.
pub fn l2_normalize(vector: &mut [f32]) -> bool {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
    true
}

/// [`EmbeddingProvider`] backed by [`fallback_embedding`].
#[derive(Debug, Clone, Copy)]
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(fallback_embedding(text, self.dimension))
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }

    fn dimensions(&self) -> usize {
        self.dimension
    }

    fn is_semantic(&self) -> bool {
        false
    }
}
