//! End-to-end tests for the retrieval pipeline over real files.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docrag::{
    EmbeddingProvider, HashingEmbedder, IngestStatus, InMemoryIndex, MetadataFilter,
    MetadataValue, ModelInfo, PipelineConfig, RagError, Result, RetrievalPipeline,
    SequentialIdGenerator, SqliteIndex, VectorIndex,
};

/// Wraps [`HashingEmbedder`] and counts backend invocations, so tests can
/// assert the no-content short-circuit never reaches the embedding service.
struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self { inner: HashingEmbedder::new(), calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_documents(texts).await
    }

    fn model_info(&self) -> ModelInfo {
        self.inner.model_info()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn write_txt(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn small_window_config() -> PipelineConfig {
    PipelineConfig::builder()
        .collection("docs")
        .chunk_size(10)
        .chunk_overlap(2)
        .default_top_k(5)
        .build()
        .unwrap()
}

fn pipeline_with(
    config: PipelineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
) -> RetrievalPipeline {
    RetrievalPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .vector_index(index)
        .id_generator(Arc::new(SequentialIdGenerator::new()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn ingest_then_search_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "ml.txt", "machine learning is great");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );

    let report = pipeline.ingest(&[path]).await.unwrap();
    assert_eq!(report.status, IngestStatus::Indexed);
    assert_eq!(report.files_processed, 1);
    // 25 characters, window 10, overlap 2: ceil((25 - 2) / 8) = 3 chunks.
    assert_eq!(report.chunks_indexed, 3);
    assert_eq!(report.collection, "docs");

    let found = pipeline.search("what is machine learning", Some(3), None).await.unwrap();
    assert_eq!(found.query, "what is machine learning");
    assert!(found.num_results >= 1);
    assert_eq!(found.num_results, found.results.len());
    for pair in found.results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    for result in &found.results {
        assert_eq!(result.metadata.get("source"), Some(&MetadataValue::from("ml.txt")));
    }
}

#[tokio::test]
async fn empty_sources_short_circuit_before_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "empty.txt", "");

    let embedder = Arc::new(CountingEmbedder::new());
    let index = Arc::new(InMemoryIndex::new());
    let pipeline = pipeline_with(small_window_config(), embedder.clone(), index.clone());

    let report = pipeline.ingest(&[path]).await.unwrap();
    assert_eq!(report.status, IngestStatus::NoContent);
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.chunks_indexed, 0);

    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.count("docs").await.unwrap(), 0);
}

#[tokio::test]
async fn stats_compose_count_and_model_info() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "ml.txt", "machine learning is great");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );

    let stats = pipeline.stats().await.unwrap();
    assert_eq!(stats.total_chunks, 0);

    pipeline.ingest(&[path]).await.unwrap();

    let stats = pipeline.stats().await.unwrap();
    assert_eq!(stats.total_chunks, 3);
    assert_eq!(stats.collection_name, "docs");
    assert_eq!(stats.embedding_model, "hashing-384");
    assert_eq!(stats.embedding_dimension, 384);
}

#[tokio::test]
async fn filter_restricts_results_to_one_source() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_txt(&dir, "first.txt", "alpha beta gamma delta epsilon");
    let second = write_txt(&dir, "second.txt", "zeta eta theta iota kappa");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );
    pipeline.ingest(&[first, second]).await.unwrap();

    let filter = MetadataFilter::new().with("source", "first.txt");
    let found = pipeline.search("alpha", Some(10), Some(&filter)).await.unwrap();
    assert!(found.num_results >= 1);
    for result in &found.results {
        assert_eq!(result.metadata.get("source"), Some(&MetadataValue::from("first.txt")));
    }
}

#[tokio::test]
async fn k_beyond_collection_size_returns_all_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "ml.txt", "machine learning is great");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );
    let report = pipeline.ingest(&[path]).await.unwrap();

    let found = pipeline.search("machine", Some(50), None).await.unwrap();
    assert_eq!(found.num_results, report.chunks_indexed);
}

#[tokio::test]
async fn reset_collection_empties_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "ml.txt", "machine learning is great");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );
    pipeline.ingest(&[path]).await.unwrap();
    assert_eq!(pipeline.stats().await.unwrap().total_chunks, 3);

    pipeline.reset_collection().await.unwrap();
    assert_eq!(pipeline.stats().await.unwrap().total_chunks, 0);
}

#[tokio::test]
async fn unsupported_extension_fails_ingestion() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "data.csv", "a,b,c");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );

    let result = pipeline.ingest(&[path]).await;
    assert!(matches!(result, Err(RagError::UnsupportedFormat { .. })));
}

#[tokio::test]
async fn empty_query_is_searched_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_txt(&dir, "ml.txt", "machine learning is great");

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(InMemoryIndex::new()),
    );
    pipeline.ingest(&[path]).await.unwrap();

    let found = pipeline.search("", Some(3), None).await.unwrap();
    assert_eq!(found.num_results, found.results.len());
}

#[tokio::test]
async fn ingested_records_survive_a_new_pipeline_over_the_same_directory() {
    let source_dir = tempfile::tempdir().unwrap();
    let index_dir = tempfile::tempdir().unwrap();
    let path = write_txt(&source_dir, "ml.txt", "machine learning is great");

    {
        let pipeline = pipeline_with(
            small_window_config(),
            Arc::new(HashingEmbedder::new()),
            Arc::new(SqliteIndex::open(index_dir.path()).unwrap()),
        );
        pipeline.ingest(&[path]).await.unwrap();
    }

    let pipeline = pipeline_with(
        small_window_config(),
        Arc::new(HashingEmbedder::new()),
        Arc::new(SqliteIndex::open(index_dir.path()).unwrap()),
    );

    assert_eq!(pipeline.stats().await.unwrap().total_chunks, 3);
    let found = pipeline.search("machine learning", Some(3), None).await.unwrap();
    assert!(found.num_results >= 1);
}
