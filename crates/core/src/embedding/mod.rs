//! Embedding capability
//!
//! Callers only ever see [`FailoverEmbedder`]: it tries the primary
//! provider and falls back to the deterministic digest embedding, so both
//! paths honour the same unit-norm, fixed-dimension contract.

pub mod failover;
pub mod fallback;

use async_trait::async_trait;
use aura_domain::Result;

pub use failover::FailoverEmbedder;
pub use fallback::{fallback_embedding, l2_normalize, HashEmbeddingProvider};

/// Produces a fixed-dimension vector for a piece of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_id(&self) -> &str;

    fn dimensions(&self) -> usize;

    /// Whether this provider produces semantically meaningful embeddings.
    /// Returns false for digest-based providers.
    fn is_semantic(&self) -> bool {
        true
    }
}
