//! Error taxonomy shared by the core pipeline and the application crate.

use thiserror::Error;

/// Errors produced by the askdoc pipeline.
///
/// Ingestion errors (`Configuration`, `UnsupportedFormat`, `Extraction`,
/// `Persistence`) are fatal to the single ingestion call that raised them.
/// `Generation` is always recovered locally by the orchestrator's fallback
/// answer and never surfaces as a request failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid chunking parameters (`chunk_overlap >= chunk_size`, zero size).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// File extension outside the supported set, or an image upload without
    /// an available OCR capability.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Format-specific text extraction failure (encrypted document, no
    /// extractable text).
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// I/O failure while loading or saving the corpus snapshot.
    #[error("corpus persistence failed: {0}")]
    Persistence(String),

    /// Generation collaborator timeout, non-success status, or transport
    /// failure.
    #[error("generation service error: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
