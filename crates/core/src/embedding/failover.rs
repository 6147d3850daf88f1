//! Primary/fallback embedding decorator

use std::sync::Arc;

use async_trait::async_trait;
use aura_domain::Result;
use tracing::warn;

use super::fallback::{l2_normalize, HashEmbeddingProvider};
use super::EmbeddingProvider;

/// Wraps an optional primary provider. Any primary failure, dimension
/// mismatch or zero vector is replaced by the digest embedding, so `embed`
/// never fails and always returns a unit vector of the configured dimension.
#[derive(Clone)]
pub struct FailoverEmbedder {
    primary: Option<Arc<dyn EmbeddingProvider>>,
    fallback: HashEmbeddingProvider,
}

impl FailoverEmbedder {
    pub fn new(primary: Option<Arc<dyn EmbeddingProvider>>, dimension: usize) -> Self {
        Self { primary, fallback: HashEmbeddingProvider::new(dimension) }
    }

    /// Digest embeddings only.
    pub fn offline(dimension: usize) -> Self {
        Self::new(None, dimension)
    }

    async fn try_primary(&self, primary: &dyn EmbeddingProvider, text: &str) -> Option<Vec<f32>> {
        let mut vector = match primary.embed(text).await {
            Ok(vector) => vector,
            Err(err) => {
                warn!(error = %err, model = primary.model_id(), "primary embedding failed; using fallback");
                return None;
            }
        };
        if vector.len() != self.fallback.dimensions() {
            warn!(
                expected = self.fallback.dimensions(),
                actual = vector.len(),
                "primary embedding has wrong dimension; using fallback"
            );
            return None;
        }
        if !l2_normalize(&mut vector) {
            warn!("primary embedding is degenerate; using fallback");
            return None;
        }
        Some(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for FailoverEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(primary) = &self.primary {
            if let Some(vector) = self.try_primary(primary.as_ref(), text).await {
                return Ok(vector);
            }
        }
        self.fallback.embed(text).await
    }

    fn model_id(&self) -> &str {
        self.primary.as_ref().map_or_else(|| self.fallback.model_id(), |p| p.model_id())
    }

    fn dimensions(&self) -> usize {
        self.fallback.dimensions()
    }

    fn is_semantic(&self) -> bool {
        self.primary.as_ref().is_some_and(|p| p.is_semantic())
    }
}
