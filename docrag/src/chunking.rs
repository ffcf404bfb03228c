//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], which
//! splits extracted text into overlapping fixed-size windows. Chunks carry the
//! source metadata plus their zero-based position among the chunks produced
//! from the same source.

use crate::document::{Chunk, Metadata, MetadataValue};
use crate::error::{RagError, Result};

/// A strategy for splitting extracted text into chunks.
///
/// Implementations are pure: the same text and metadata always produce the
/// same chunks, and no state is touched.
pub trait Chunker: Send + Sync {
    /// Split text into chunks, merging `source_metadata` into each chunk's
    /// metadata along with a zero-based `chunk_index`.
    ///
    /// Returns an empty `Vec` for empty input.
    fn split(&self, text: &str, source_metadata: &Metadata) -> Vec<Chunk>;
}

/// Splits text into fixed-size overlapping windows, measured in characters.
///
/// Windows advance by `chunk_size - chunk_overlap` characters and the final
/// window ends exactly at the end of input, so the whole text is covered with
/// no gaps and consecutive chunks share exactly `chunk_overlap` characters.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(512, 100)?;
/// let chunks = chunker.split(&text, &metadata);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - number of characters per window
    /// * `chunk_overlap` - number of characters shared between consecutive windows
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, text: &str, source_metadata: &Metadata) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Windows are measured in characters so multi-byte text never gets
        // sliced mid-sequence.
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index: i64 = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());

            let mut metadata = source_metadata.clone();
            metadata.insert("chunk_index".to_string(), MetadataValue::Integer(chunk_index));

            chunks.push(Chunk { text: chars[start..end].iter().collect(), metadata });

            if end == chars.len() {
                break;
            }
            start += step;
            chunk_index += 1;
        }

        chunks
    }
}
