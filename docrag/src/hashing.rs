//! Deterministic hashing embedder for development and tests.
//!
//! [`HashingEmbedder`] needs no model weights and no network: it hashes each
//! whitespace token into a fixed-dimensional bucket vector and L2-normalizes
//! the result. Texts sharing tokens get nearby vectors, which is enough to
//! exercise the full ingest-and-search path.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::{EmbeddingProvider, ModelInfo};
use crate::error::Result;

/// Default dimensionality, matching common sentence-embedding models.
const DEFAULT_DIMENSION: usize = 384;

/// An [`EmbeddingProvider`] that derives vectors from token hashes.
///
/// Embeddings are a pure function of the input text and the configured
/// dimension, so repeated calls always return identical vectors. Not a
/// substitute for a learned model; retrieval quality is limited to exact
/// token overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::HashingEmbedder;
///
/// let embedder = HashingEmbedder::new();
/// let vector = embedder.embed_query("hello world").await?;
/// assert_eq!(vector.len(), 384);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the default dimension (384).
    pub fn new() -> Self {
        Self { dimension: DEFAULT_DIMENSION }
    }

    /// Create a new hashing embedder with a custom dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dimension];

        for token in text.split_whitespace() {
            let lowered = token.to_lowercase();
            let digest = Sha256::digest(lowered.as_bytes());
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(raw) % self.dimension as u64) as usize;
            out[bucket] += 1.0;
        }

        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut out {
                *v /= norm;
            }
        }

        out
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            model_name: format!("hashing-{}", self.dimension),
            embedding_dimension: self.dimension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let embedder = HashingEmbedder::new();
        let a = embedder.embed_query("machine learning is great").await.unwrap();
        let b = embedder.embed_query("machine learning is great").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn batch_output_matches_input_order_and_length() {
        let embedder = HashingEmbedder::new();
        let vectors = embedder.embed_documents(&["first text", "second text"]).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], embedder.embed_query("first text").await.unwrap());
        assert_eq!(vectors[1], embedder.embed_query("second text").await.unwrap());
    }

    #[tokio::test]
    async fn query_equals_single_document_batch() {
        let embedder = HashingEmbedder::new();
        let batch = embedder.embed_documents(&["some text"]).await.unwrap();
        let single = embedder.embed_query("some text").await.unwrap();
        assert_eq!(batch[0], single);
    }

    #[tokio::test]
    async fn vectors_have_configured_dimension_and_unit_norm() {
        let embedder = HashingEmbedder::with_dimension(64);
        let vector = embedder.embed_query("hello world").await.unwrap();
        assert_eq!(vector.len(), 64);
        assert_eq!(embedder.model_info().embedding_dimension, 64);

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let embedder = HashingEmbedder::with_dimension(16);
        let vector = embedder.embed_query("").await.unwrap();
        assert_eq!(vector.len(), 16);
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn shared_tokens_give_closer_vectors() {
        let embedder = HashingEmbedder::new();
        let base = embedder.embed_query("machine learning is great").await.unwrap();
        let related = embedder.embed_query("what is machine learning").await.unwrap();
        let unrelated = embedder.embed_query("completely different words here").await.unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&base, &related) > dot(&base, &unrelated));
    }
}
