//! Qdrant vector index backend.
//!
//! Provides [`QdrantVectorIndex`] which implements [`VectorIndex`] using the
//! [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC. Because
//! Qdrant fixes a collection's vector size at creation, the engine-side
//! collection is created on the first insert, when the dimensionality is
//! known; `create_collection` itself only handles the reset case.
//!
//! This module is only available when the `qdrant` feature is enabled.

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, Range,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;

use crate::document::{Metadata, MetadataFilter, MetadataValue, QueryMatch};
use crate::error::{RagError, Result};
use crate::index::{check_dimensions, resolve_batch_ids, VectorIndex};

const BACKEND: &str = "qdrant";

/// A [`VectorIndex`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections map to Qdrant collections with cosine distance; record text
/// and metadata are stored as point payload, and metadata filters translate
/// to Qdrant `must` conditions evaluated inside the engine.
pub struct QdrantVectorIndex {
    client: Qdrant,
}

impl QdrantVectorIndex {
    /// Create a new Qdrant index connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant index with the default URL (`http://localhost:6334`).
    pub fn default_url() -> Result<Self> {
        Self::new("http://localhost:6334")
    }

    /// Create a new Qdrant index from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::Index { backend: BACKEND.to_string(), message: e.to_string() }
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        Ok(collections.collections.iter().any(|c| c.name == name))
    }

    /// The vector size the engine recorded for a collection, if available.
    async fn established_dimension(&self, name: &str) -> Result<Option<usize>> {
        let info = self.client.collection_info(name).await.map_err(Self::map_err)?;
        let size = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                VectorsConfigKind::Params(params) => Some(params.size as usize),
                VectorsConfigKind::ParamsMap(_) => None,
            });
        Ok(size)
    }

    fn filter_to_conditions(filter: &MetadataFilter) -> Vec<Condition> {
        filter
            .entries
            .iter()
            .map(|(key, value)| {
                let field = format!("metadata.{key}");
                match value {
                    MetadataValue::Text(s) => Condition::matches(field, s.clone()),
                    MetadataValue::Integer(i) => Condition::matches(field, *i),
                    MetadataValue::Bool(b) => Condition::matches(field, *b),
                    // Qdrant has no float equality match; a degenerate range
                    // expresses the same predicate.
                    MetadataValue::Float(f) => Condition::range(
                        field,
                        Range { lt: None, gt: None, gte: Some(*f), lte: Some(*f) },
                    ),
                }
            })
            .collect()
    }

    fn payload_value_to_metadata(value: &QdrantValue) -> Option<MetadataValue> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(MetadataValue::Text(s.clone())),
            Some(Kind::IntegerValue(i)) => Some(MetadataValue::Integer(*i)),
            Some(Kind::DoubleValue(d)) => Some(MetadataValue::Float(*d)),
            Some(Kind::BoolValue(b)) => Some(MetadataValue::Bool(*b)),
            _ => None,
        }
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn create_collection(&self, name: &str, reset: bool) -> Result<()> {
        if reset && self.collection_exists(name).await? {
            self.client.delete_collection(name).await.map_err(Self::map_err)?;
            debug!(collection = name, "reset qdrant collection");
        }
        // The engine-side collection is created on first insert, when the
        // dimensionality is known.
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
        let ids = resolve_batch_ids(BACKEND, texts, vectors, metadatas, ids)?;
        if ids.is_empty() {
            return Ok(ids);
        }

        let established = if self.collection_exists(collection).await? {
            self.established_dimension(collection).await?
        } else {
            None
        };
        let dimension = check_dimensions(established, vectors)?;

        if established.is_none() {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(collection).vectors_config(
                        VectorParamsBuilder::new(dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(Self::map_err)?;
            debug!(collection, dimension, "created qdrant collection");
        }

        let points: Vec<PointStruct> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let mut payload_map = serde_json::Map::new();
                payload_map
                    .insert("text".to_string(), serde_json::Value::String(texts[i].clone()));
                payload_map.insert(
                    "metadata".to_string(),
                    serde_json::to_value(&metadatas[i])
                        .unwrap_or(serde_json::Value::Object(Default::default())),
                );

                let payload =
                    Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

                PointStruct::new(id.clone(), vectors[i].clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = ids.len(), "upserted records to qdrant");
        Ok(ids)
    }

    async fn similarity_search(
        &self,
        collection: &str,
        query_vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<QueryMatch>> {
        if !self.collection_exists(collection).await? {
            return Ok(Vec::new());
        }

        if let Some(expected) = self.established_dimension(collection).await? {
            if query_vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }

        let mut request =
            SearchPointsBuilder::new(collection, query_vector.to_vec(), k as u64)
                .with_payload(true);
        if let Some(filter) = filter {
            if !filter.is_empty() {
                request = request.filter(Filter::must(Self::filter_to_conditions(filter)));
            }
        }

        let response = self.client.search_points(request).await.map_err(Self::map_err)?;

        let matches = response
            .result
            .into_iter()
            .map(|scored| {
                let text =
                    scored.payload.get("text").and_then(Self::extract_string).unwrap_or_default();

                let metadata: Metadata = scored
                    .payload
                    .get("metadata")
                    .and_then(|v| match &v.kind {
                        Some(Kind::StructValue(s)) => Some(
                            s.fields
                                .iter()
                                .filter_map(|(k, v)| {
                                    Self::payload_value_to_metadata(v).map(|m| (k.clone(), m))
                                })
                                .collect(),
                        ),
                        _ => None,
                    })
                    .unwrap_or_default();

                // Qdrant reports cosine similarity; convert to distance.
                QueryMatch { text, metadata, distance: 1.0 - scored.score }
            })
            .collect();

        Ok(matches)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        if !self.collection_exists(collection).await? {
            return Ok(0);
        }
        let info = self.client.collection_info(collection).await.map_err(Self::map_err)?;
        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0) as usize)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if !self.collection_exists(name).await? {
            return Ok(());
        }
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }
}
