//! Data types for chunks, indexed records, metadata, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A scalar metadata value.
///
/// Metadata is restricted to this closed set so filter predicates stay
/// well-defined and every value serializes to plain JSON scalars.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating-point number.
    Float(f64),
    /// UTF-8 string.
    Text(String),
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Key-value metadata attached to chunks and indexed records.
pub type Metadata = HashMap<String, MetadataValue>;

/// A unit of indexable text produced by a chunker.
///
/// Chunks are immutable once created and are consumed exactly once by the
/// ingestion path; only the derived vector and metadata persist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// Source metadata merged with chunk-specific fields (`chunk_index`).
    pub metadata: Metadata,
}

/// A persisted unit in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedRecord {
    /// Globally unique identifier, generated at ingestion time.
    pub id: String,
    /// The embedding vector for this record's text.
    pub vector: Vec<f32>,
    /// The original chunk text, stored for retrieval-time display.
    pub text: String,
    /// Key-value metadata carried over from the chunk.
    pub metadata: Metadata,
}

/// A single entry of a query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    /// The stored chunk text.
    pub text: String,
    /// The stored metadata.
    pub metadata: Metadata,
    /// Cosine distance to the query vector (0 means identical direction).
    pub distance: f32,
}

/// An equality-conjunction predicate over record metadata.
///
/// A record matches when every entry in the filter equals the record's
/// metadata value under the same key. Richer comparison operators
/// (ranges, disjunction) are intentionally not supported.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::MetadataFilter;
///
/// let filter = MetadataFilter::new().with("source", "report.txt");
/// assert!(filter.matches(&metadata));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MetadataFilter {
    /// The key-value pairs a record must all match.
    pub entries: HashMap<String, MetadataValue>,
}

impl MetadataFilter {
    /// Create an empty filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Whether the given metadata satisfies every condition in this filter.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.entries.iter().all(|(key, expected)| metadata.get(key) == Some(expected))
    }

    /// Whether this filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
