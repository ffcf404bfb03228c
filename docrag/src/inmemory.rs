//! In-memory vector index using exhaustive cosine scan.
//!
//! This module provides [`InMemoryIndex`], a vector index backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Records do not survive a
//! process restart; it exists for development and tests, where the durable
//! [`SqliteIndex`](crate::sqlite::SqliteIndex) would only add I/O.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{IndexedRecord, Metadata, MetadataFilter, QueryMatch};
use crate::error::{RagError, Result};
use crate::index::{check_dimensions, cosine_distance, resolve_batch_ids, VectorIndex};

#[derive(Debug, Default)]
struct Collection {
    dimension: Option<usize>,
    records: Vec<IndexedRecord>,
}

/// An in-memory [`VectorIndex`] using cosine distance.
///
/// Collections are created lazily on first insert, so calling
/// [`create_collection`](VectorIndex::create_collection) ahead of time is
/// optional. All operations are async-safe via `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn create_collection(&self, name: &str, reset: bool) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(name.to_string()).or_default();
        if reset {
            collection.records.clear();
            collection.dimension = None;
        }
        Ok(())
    }

    async fn add_documents(
        &self,
        collection: &str,
        texts: &[String],
        vectors: &[Vec<f32>],
        metadatas: &[Metadata],
        ids: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        let ids = resolve_batch_ids("in-memory", texts, vectors, metadatas, ids)?;

        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();

        let dimension = check_dimensions(entry.dimension, vectors)?;
        if !vectors.is_empty() {
            entry.dimension = Some(dimension);
        }

        for (i, id) in ids.iter().enumerate() {
            entry.records.push(IndexedRecord {
                id: id.clone(),
                vector: vectors[i].clone(),
                text: texts[i].clone(),
                metadata: metadatas[i].clone(),
            });
        }

        Ok(ids)
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        let collections = self.collections.read().await;
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        if let Some(expected) = entry.dimension {
            if query_vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }

        let mut matches: Vec<QueryMatch> = entry
            .records
            .iter()
            .filter(|record| filter.is_none_or(|f| f.matches(&record.metadata)))
            .map(|record| QueryMatch {
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                distance: cosine_distance(&record.vector, query_vector),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        Ok(matches)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.records.len()).unwrap_or(0))
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MetadataValue;

    fn meta(source: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), MetadataValue::from(source));
        metadata
    }

    async fn populated_index() -> InMemoryIndex {
        let index = InMemoryIndex::new();
        index
            .add_documents(
                "docs",
                &["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
                &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
                &[meta("a"), meta("b"), meta("a")],
                None,
            )
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn round_trip_returns_identical_record_at_distance_zero() {
        let index = InMemoryIndex::new();
        index
            .add_documents(
                "docs",
                &["hello".to_string()],
                &[vec![0.5, 0.5, 0.5]],
                &[meta("a")],
                None,
            )
            .await
            .unwrap();

        let matches = index.similarity_search("docs", &[0.5, 0.5, 0.5], 1, None).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "hello");
        assert!(matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn results_are_ordered_by_ascending_distance() {
        let index = populated_index().await;
        let matches = index.similarity_search("docs", &[1.0, 0.0], 3, None).await.unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].text, "alpha");
        for pair in matches.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[tokio::test]
    async fn filter_restricts_eligible_records() {
        let index = populated_index().await;
        let filter = MetadataFilter::new().with("source", "a");
        let matches =
            index.similarity_search("docs", &[1.0, 0.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(matches.len(), 2);
        for m in &matches {
            assert_eq!(m.metadata.get("source"), Some(&MetadataValue::from("a")));
        }
    }

    #[tokio::test]
    async fn k_larger_than_collection_returns_everything() {
        let index = populated_index().await;
        let matches = index.similarity_search("docs", &[1.0, 0.0], 50, None).await.unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[tokio::test]
    async fn absent_collection_searches_empty_and_counts_zero() {
        let index = InMemoryIndex::new();
        assert!(index.similarity_search("nope", &[1.0], 5, None).await.unwrap().is_empty());
        assert_eq!(index.count("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dimension_is_established_by_first_insert() {
        let index = populated_index().await;
        let result = index
            .add_documents("docs", &["bad".to_string()], &[vec![1.0]], &[meta("a")], None)
            .await;
        assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 2, actual: 1 })));
    }

    #[tokio::test]
    async fn query_vector_dimension_is_checked() {
        let index = populated_index().await;
        let result = index.similarity_search("docs", &[1.0, 0.0, 0.0], 3, None).await;
        assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 2, actual: 3 })));
    }

    #[tokio::test]
    async fn reset_drops_records_and_preserves_identity() {
        let index = populated_index().await;
        assert_eq!(index.count("docs").await.unwrap(), 3);

        index.create_collection("docs", true).await.unwrap();
        assert_eq!(index.count("docs").await.unwrap(), 0);

        // Dimensionality is re-established after a reset.
        index
            .add_documents("docs", &["fresh".to_string()], &[vec![1.0]], &[meta("a")], None)
            .await
            .unwrap();
        assert_eq!(index.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_collection_without_reset_preserves_records() {
        let index = populated_index().await;
        index.create_collection("docs", false).await.unwrap();
        assert_eq!(index.count("docs").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn delete_collection_is_idempotent() {
        let index = populated_index().await;
        index.delete_collection("docs").await.unwrap();
        assert_eq!(index.count("docs").await.unwrap(), 0);
        index.delete_collection("docs").await.unwrap();
    }

    #[tokio::test]
    async fn returned_ids_match_batch_order() {
        let index = InMemoryIndex::new();
        let ids = index
            .add_documents(
                "docs",
                &["a".to_string(), "b".to_string()],
                &[vec![1.0], vec![2.0]],
                &[meta("x"), meta("x")],
                Some(vec!["id-a".to_string(), "id-b".to_string()]),
            )
            .await
            .unwrap();
        assert_eq!(ids, vec!["id-a".to_string(), "id-b".to_string()]);
    }
}
