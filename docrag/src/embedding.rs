//! Embedding provider trait for converting text into vectors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Static descriptor of a configured embedding model.
///
/// Constant for the lifetime of a provider instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    /// The model name or identifier.
    pub model_name: String,
    /// The dimensionality of every vector the model produces.
    pub embedding_dimension: usize,
}

/// A provider that converts text into fixed-dimensional vectors.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. Documents and queries are embedded with the same model and
/// configuration, so their vectors are directly comparable. Embedding the
/// same text twice yields the same vector.
///
/// The default [`embed_query`](EmbeddingProvider::embed_query) delegates to
/// [`embed_documents`](EmbeddingProvider::embed_documents) with a
/// single-element batch, so the two paths cannot drift apart.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::EmbeddingProvider;
///
/// let vectors = provider.embed_documents(&["first", "second"]).await?;
/// assert_eq!(vectors.len(), 2);
/// assert_eq!(vectors[0].len(), provider.model_info().embedding_dimension);
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    ///
    /// The output has exactly one vector per input, in input order.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text]).await?;
        if vectors.is_empty() {
            return Err(RagError::Embedding {
                provider: self.model_info().model_name,
                message: "backend returned no vectors for a single-text batch".to_string(),
            });
        }
        Ok(vectors.swap_remove(0))
    }

    /// Describe the configured model.
    fn model_info(&self) -> ModelInfo;
}
