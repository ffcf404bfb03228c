//! Text extraction boundary.
//!
//! The core never parses document formats itself; it consumes extracted plain
//! text through the [`TextExtractor`] trait. [`PlainTextExtractor`] covers
//! `.txt` sources; structured formats (`.pdf`, `.docx`) are recognized by
//! [`SourceFormat`] but their extraction belongs to external implementations
//! of the trait.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// The enumerated set of accepted source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Plain UTF-8 text (`.txt`).
    PlainText,
    /// PDF documents (`.pdf`).
    Pdf,
    /// Word documents (`.docx`).
    Docx,
}

impl SourceFormat {
    /// Determine the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] for anything outside the
    /// `.txt` / `.pdf` / `.docx` allow-list.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(Self::PlainText),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(RagError::UnsupportedFormat { path: path.to_path_buf() }),
        }
    }
}

/// A collaborator that turns a source file into plain text.
///
/// Implementations decide which [`SourceFormat`]s they can handle and fail
/// with [`RagError::UnsupportedFormat`] for the rest.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Whether this extractor handles the given format.
    fn supports(&self, format: SourceFormat) -> bool;

    /// Extract plain text from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] for formats outside
    /// [`supports`](TextExtractor::supports), and [`RagError::Extraction`]
    /// when reading or parsing the file fails.
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Extractor for plain text files. The default collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    /// Create a new plain text extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn supports(&self, format: SourceFormat) -> bool {
        format == SourceFormat::PlainText
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let format = SourceFormat::from_path(path)?;
        if !self.supports(format) {
            return Err(RagError::UnsupportedFormat { path: path.to_path_buf() });
        }

        tokio::fs::read_to_string(path).await.map_err(|e| RagError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
