//! Error types for the `docrag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A source file has an extension outside the supported set.
    #[error("Unsupported format: {}", .path.display())]
    UnsupportedFormat {
        /// The offending file path.
        path: PathBuf,
    },

    /// Text extraction from a source file failed.
    #[error("Extraction error ({}): {message}", .path.display())]
    Extraction {
        /// The file that failed to extract.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's length disagrees with the collection's established dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality established by the collection's first insert.
        expected: usize,
        /// The dimensionality of the offending vector.
        actual: usize,
    },

    /// An error occurred in the vector index backend.
    #[error("Index error ({backend}): {message}")]
    Index {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
