//! Vector index trait for storing records and answering similarity queries.

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::{Metadata, MetadataFilter, QueryMatch};
use crate::error::{RagError, Result};

/// A storage backend for embedding vectors with filtered similarity search.
///
/// Implementations manage named collections of records, each record carrying
/// a vector, its source text, and metadata. Collections use cosine distance
/// and a single dimensionality, established by the first insert. Records are
/// immutable; they disappear only through a collection reset or delete.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{VectorIndex, InMemoryIndex};
///
/// let index = InMemoryIndex::new();
/// index.create_collection("docs", false).await?;
/// let ids = index.add_documents("docs", &texts, &vectors, &metadatas, None).await?;
/// let matches = index.similarity_search("docs", &query_vector, 5, None).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create a named collection, or return it if it already exists.
    ///
    /// With `reset`, any existing records are dropped first and the
    /// collection's dimensionality is re-established by the next insert.
    async fn create_collection(&self, name: &str, reset: bool) -> Result<()>;

    /// Append records to a collection.
    ///
    /// `texts`, `vectors`, and `metadatas` must have equal lengths. When
    /// `ids` is `None`, unique identifiers are generated internally; the
    /// generated (or provided) ids are returned in record order. The first
    /// insert into a collection establishes its dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if any vector's length
    /// disagrees with the collection's established dimensionality, and
    /// [`RagError::Index`] on mismatched slice lengths or backend failure.
    async fn add_documents(
        &self,
        collection: &str,
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[Metadata],
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>>;

    /// Return up to `k` records nearest to `query_vector` by cosine distance,
    /// ascending.
    ///
    /// When `filter` is present, only records whose metadata satisfies it are
    /// eligible and `k` applies after filtering. Fewer than `k` eligible
    /// records returns all of them; an empty or absent collection returns an
    /// empty result.
    async fn similarity_search(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>>;

    /// Number of records currently persisted in the collection; 0 if the
    /// collection does not exist.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Permanently remove a collection and all its records.
    ///
    /// A no-op if the collection does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;
}

/// Cosine distance between two equal-length vectors: `1 - cos(a, b)`.
///
/// Identical directions give 0, orthogonal vectors give 1. A zero-magnitude
/// vector is treated as maximally distant.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

/// Check the parallel batch slices and resolve record ids, generating UUIDs
/// when the caller omitted them.
pub(crate) fn resolve_batch_ids(
    backend: &str,
    texts: &[String],
    vectors: &[Vec<f32>],
    metadatas: &[Metadata],
    ids: Option<Vec<String>>,
) -> Result<Vec<String>> {
    if texts.len() != vectors.len() || texts.len() != metadatas.len() {
        return Err(RagError::Index {
            backend: backend.to_string(),
            message: format!(
                "texts ({}), vectors ({}), and metadatas ({}) must have equal lengths",
                texts.len(),
                vectors.len(),
                metadatas.len()
            ),
        });
    }

    match ids {
        Some(ids) if ids.len() != texts.len() => Err(RagError::Index {
            backend: backend.to_string(),
            message: format!("ids ({}) must match texts ({})", ids.len(), texts.len()),
        }),
        Some(ids) => Ok(ids),
        None => Ok((0..texts.len()).map(|_| Uuid::new_v4().to_string()).collect()),
    }
}

/// Verify every vector in a batch against the collection's established
/// dimensionality, or establish it from the first vector.
pub(crate) fn check_dimensions(established: Option<usize>, vectors: &[Vec<f32>]) -> Result<usize> {
    let expected = match established {
        Some(dim) => dim,
        None => vectors.first().map(|v| v.len()).unwrap_or(0),
    };
    for vector in vectors {
        if vector.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: vector.len() });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_distance_of_identical_vectors_is_zero() {
        let v = vec![0.3, -0.4, 0.5];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn cosine_distance_of_orthogonal_vectors_is_one() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_maximally_distant() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(cosine_distance(&a, &b), 1.0);
    }

    #[test]
    fn batch_length_mismatch_is_rejected() {
        let texts = vec!["a".to_string()];
        let vectors: Vec<Vec<f32>> = vec![];
        let metadatas = vec![Metadata::new()];
        let result = resolve_batch_ids("test", &texts, &vectors, &metadatas, None);
        assert!(matches!(result, Err(RagError::Index { .. })));
    }

    #[test]
    fn omitted_ids_are_generated_per_record() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let vectors = vec![vec![1.0], vec![2.0]];
        let metadatas = vec![Metadata::new(), Metadata::new()];
        let ids = resolve_batch_ids("test", &texts, &vectors, &metadatas, None).unwrap();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn provided_ids_must_match_batch_length() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let vectors = vec![vec![1.0], vec![2.0]];
        let metadatas = vec![Metadata::new(), Metadata::new()];
        let result = resolve_batch_ids(
            "test",
            &texts,
            &vectors,
            &metadatas,
            Some(vec!["only-one".to_string()]),
        );
        assert!(matches!(result, Err(RagError::Index { .. })));
    }

    #[test]
    fn first_batch_establishes_dimensionality() {
        let vectors = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(check_dimensions(None, &vectors).unwrap(), 2);
    }

    #[test]
    fn disagreeing_vector_fails_the_batch() {
        let vectors = vec![vec![1.0, 2.0], vec![3.0]];
        let result = check_dimensions(None, &vectors);
        assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 2, actual: 1 })));

        let result = check_dimensions(Some(3), &[vec![1.0, 2.0]]);
        assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 3, actual: 2 })));
    }
}
