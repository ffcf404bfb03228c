//! Document indexing and semantic retrieval core.
//!
//! `docrag` turns uploaded documents into searchable vector records and
//! answers semantic queries against them. The pipeline splits extracted text
//! into overlapping chunks, embeds chunks and queries with the same model,
//! stores vectors with their text and metadata in a named collection, and
//! retrieves nearest neighbors by cosine distance with optional
//! equality-conjunction metadata filtering.
//!
//! # Architecture
//!
//! - [`Chunker`] / [`FixedSizeChunker`]: overlapping fixed-size windows over
//!   extracted text.
//! - [`EmbeddingProvider`]: batch and single-query embedding behind one
//!   trait; [`HashingEmbedder`] is an always-available deterministic
//!   implementation, and the `openai` feature adds an API-backed one.
//! - [`VectorIndex`]: named collections of immutable records with filtered
//!   nearest-neighbor search; [`SqliteIndex`] persists to local disk,
//!   [`InMemoryIndex`] serves development and tests, and the `qdrant`
//!   feature adds a remote engine.
//! - [`RetrievalPipeline`]: the orchestrator wiring extraction, chunking,
//!   embedding, and the index into ingest / search / stats operations.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docrag::{HashingEmbedder, RetrievalPipeline, SqliteIndex};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .embedding_provider(Arc::new(HashingEmbedder::new()))
//!     .vector_index(Arc::new(SqliteIndex::open("./index_data")?))
//!     .build()?;
//!
//! let report = pipeline.ingest(&[path]).await?;
//! let found = pipeline.search("what is machine learning", Some(3), None).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod hashing;
pub mod idgen;
pub mod index;
pub mod inmemory;
pub mod pipeline;
pub mod sqlite;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{
    Chunk, IndexedRecord, Metadata, MetadataFilter, MetadataValue, QueryMatch,
};
pub use embedding::{EmbeddingProvider, ModelInfo};
pub use error::{RagError, Result};
pub use extract::{PlainTextExtractor, SourceFormat, TextExtractor};
pub use hashing::HashingEmbedder;
pub use idgen::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use index::VectorIndex;
pub use inmemory::InMemoryIndex;
pub use pipeline::{
    IngestReport, IngestStatus, PipelineStats, RetrievalPipeline, RetrievalPipelineBuilder,
    SearchReport,
};
pub use sqlite::SqliteIndex;

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddingProvider;

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorIndex;
