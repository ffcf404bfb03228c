//! Retrieval pipeline orchestrator.
//!
//! The [`RetrievalPipeline`] coordinates ingestion (extract, chunk, embed,
//! store) and querying (embed, search, format) by composing a
//! [`TextExtractor`], a [`Chunker`], an [`EmbeddingProvider`], a
//! [`VectorIndex`], and an [`IdGenerator`]. It is constructed once at process
//! start and passed by reference to request handlers; there is no global
//! state.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{RetrievalPipeline, PipelineConfig, InMemoryIndex, HashingEmbedder};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .config(PipelineConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbedder::new()))
//!     .vector_index(Arc::new(InMemoryIndex::new()))
//!     .build()?;
//!
//! let report = pipeline.ingest(&paths).await?;
//! let found = pipeline.search("what is machine learning", None, None).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::PipelineConfig;
use crate::document::{Metadata, MetadataFilter, MetadataValue, QueryMatch};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::idgen::{IdGenerator, UuidIdGenerator};
use crate::index::VectorIndex;

/// Outcome of an ingestion call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Chunks were embedded and written to the index.
    Indexed,
    /// The sources produced no chunks; nothing was embedded or stored.
    NoContent,
}

/// Result of [`RetrievalPipeline::ingest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Whether anything was indexed.
    pub status: IngestStatus,
    /// Number of source files processed.
    pub files_processed: usize,
    /// Number of chunks written to the index.
    pub chunks_indexed: usize,
    /// The collection the chunks were written to.
    pub collection: String,
}

/// Result of [`RetrievalPipeline::search`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// The original query text.
    pub query: String,
    /// Matches ordered by ascending distance.
    pub results: Vec<QueryMatch>,
    /// Length of `results`.
    pub num_results: usize,
}

/// Result of [`RetrievalPipeline::stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Number of records in the pipeline's collection.
    pub total_chunks: usize,
    /// The collection name.
    pub collection_name: String,
    /// The configured embedding model.
    pub embedding_model: String,
    /// The embedding dimensionality.
    pub embedding_dimension: usize,
}

/// The retrieval pipeline orchestrator.
///
/// Each operation is a self-contained pass over the collaborators; no state
/// machine persists across calls. Ingestion is not atomic across embedding
/// and storage: if the index write fails after embedding succeeded, the
/// chunks are lost and the caller re-submits the original files.
pub struct RetrievalPipeline {
    config: PipelineConfig,
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    id_generator: Arc<dyn IdGenerator>,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest source files: extract, chunk, embed, store.
    ///
    /// All chunks from all files are embedded in one batch and written to the
    /// index in one call. If the files produce no chunks at all, the call
    /// short-circuits with [`IngestStatus::NoContent`] before the embedding
    /// service or the index is touched.
    ///
    /// # Errors
    ///
    /// Propagates extraction, embedding, and index errors unchanged; the
    /// first failing file or batch fails the whole call.
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        let mut chunks = Vec::new();

        for path in paths {
            let text = self.extractor.extract(path).await.map_err(|e| {
                error!(path = %path.display(), error = %e, "extraction failed during ingestion");
                e
            })?;

            let mut source_metadata = Metadata::new();
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            source_metadata.insert("source".to_string(), MetadataValue::Text(file_name));
            source_metadata
                .insert("source_path".to_string(), MetadataValue::Text(path.display().to_string()));

            chunks.extend(self.chunker.split(&text, &source_metadata));
        }

        if chunks.is_empty() {
            warn!(files = paths.len(), "no content extracted from sources");
            return Ok(IngestReport {
                status: IngestStatus::NoContent,
                files_processed: paths.len(),
                chunks_indexed: 0,
                collection: self.config.collection.clone(),
            });
        }

        let vectors = {
            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            self.embedding_provider.embed_documents(&texts).await
        }
        .map_err(|e| {
            error!(chunk_count = chunks.len(), error = %e, "embedding failed during ingestion");
            e
        })?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding {
                provider: self.embedding_provider.model_info().model_name,
                message: format!("expected {} vectors, got {}", chunks.len(), vectors.len()),
            });
        }

        // Collections are created lazily on first use.
        self.vector_index.create_collection(&self.config.collection, false).await?;

        let ids: Vec<String> = chunks.iter().map(|_| self.id_generator.generate()).collect();

        let mut texts = Vec::with_capacity(chunks.len());
        let mut metadatas = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            texts.push(chunk.text);
            metadatas.push(chunk.metadata);
        }

        let stored = self
            .vector_index
            .add_documents(&self.config.collection, &texts, &vectors, &metadatas, Some(ids))
            .await
            .map_err(|e| {
                error!(collection = %self.config.collection, error = %e, "index write failed during ingestion");
                e
            })?;

        info!(
            files = paths.len(),
            chunks = stored.len(),
            collection = %self.config.collection,
            "ingestion complete"
        );

        Ok(IngestReport {
            status: IngestStatus::Indexed,
            files_processed: paths.len(),
            chunks_indexed: stored.len(),
            collection: self.config.collection.clone(),
        })
    }

    /// Search the collection for the chunks most similar to `query`.
    ///
    /// `k` defaults to the configured `default_top_k`. An empty query string
    /// is embedded and searched like any other text; callers wanting to
    /// reject it do so at their boundary.
    pub async fn search(
        &self,
        query: &str,
        k: Option<usize>,
        filter: Option<&MetadataFilter>,
    ) -> Result<SearchReport> {
        let k = k.unwrap_or(self.config.default_top_k);

        let query_vector = self.embedding_provider.embed_query(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;

        let results = self
            .vector_index
            .similarity_search(&self.config.collection, &query_vector, k, filter)
            .await
            .map_err(|e| {
                error!(collection = %self.config.collection, error = %e, "similarity search failed");
                e
            })?;

        info!(k, result_count = results.len(), "search complete");

        Ok(SearchReport { query: query.to_string(), num_results: results.len(), results })
    }

    /// Report collection size and embedding model details. Pure read.
    pub async fn stats(&self) -> Result<PipelineStats> {
        let total_chunks = self.vector_index.count(&self.config.collection).await?;
        let model_info = self.embedding_provider.model_info();

        Ok(PipelineStats {
            total_chunks,
            collection_name: self.config.collection.clone(),
            embedding_model: model_info.model_name,
            embedding_dimension: model_info.embedding_dimension,
        })
    }

    /// Drop all records from the pipeline's collection, preserving its
    /// identity.
    pub async fn reset_collection(&self) -> Result<()> {
        self.vector_index.create_collection(&self.config.collection, true).await
    }

    /// Permanently remove the pipeline's collection.
    pub async fn delete_collection(&self) -> Result<()> {
        self.vector_index.delete_collection(&self.config.collection).await
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// The embedding provider and vector index are required; the extractor,
/// chunker, and id generator have production defaults (plain text files,
/// fixed-size windows from the config, random UUIDs).
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<PipelineConfig>,
    extractor: Option<Arc<dyn TextExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the text extraction collaborator.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the chunker. Defaults to a [`FixedSizeChunker`] built from the
    /// configured window and overlap.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector index backend.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.vector_index = Some(index);
        self
    }

    /// Set the id generator used for new records.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(ids);
        self
    }

    /// Build the [`RetrievalPipeline`], validating configuration and
    /// required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if the embedding provider or vector
    /// index is missing, or if the chunk window and overlap are
    /// inconsistent.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_index = self
            .vector_index
            .ok_or_else(|| RagError::Config("vector_index is required".to_string()))?;

        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(PlainTextExtractor::new()));
        let id_generator = self.id_generator.unwrap_or_else(|| Arc::new(UuidIdGenerator));

        Ok(RetrievalPipeline {
            config,
            extractor,
            chunker,
            embedding_provider,
            vector_index,
            id_generator,
        })
    }
}
