//! Semantic embeddings over the Embeddings API

use std::sync::Arc;

use async_trait::async_trait;
use aura_core::embedding::l2_normalize;
use aura_core::EmbeddingProvider;
use aura_domain::{AuraError, Result};
use tracing::instrument;

use super::client::OpenAIClient;

/// Embedding provider backed by an OpenAI-compatible embeddings endpoint.
///
/// Vectors are requested at the configured dimension and unit-normalized
/// before they are handed out.
pub struct OpenAIEmbeddingProvider {
    client: Arc<OpenAIClient>,
    dimension: usize,
}

impl OpenAIEmbeddingProvider {
    pub fn new(client: Arc<OpenAIClient>, dimension: usize) -> Self {
        Self { client, dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    #[instrument(skip_all, fields(dimension = self.dimension))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = self.client.embed(text, Some(self.dimension)).await?;

        if vector.len() != self.dimension {
            return Err(AuraError::External(format!(
                "embedding has {} dimensions, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        if !l2_normalize(&mut vector) {
            return Err(AuraError::External("embedding is a zero vector".into()));
        }
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        self.client.embedding_model()
    }

    fn dimensions(&self) -> usize {
        self.dimension
    }
}
