//! Ingestion pipeline: bytes in, corpus records out.
//!
//! `ingest_bytes` ties extraction, cleaning, and chunking together and
//! appends the resulting records to the corpus store. `ingest_file` is the
//! filesystem-facing wrapper used by the CLI.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use askdoc_core::chunk::chunk_text;
use askdoc_core::models::ChunkRecord;
use askdoc_core::store::CorpusStore;
use askdoc_core::{Error, Result};

use crate::config::ChunkingConfig;
use crate::extract::{clean_text, extension_of, extract_text, FileFormat};
use crate::ocr::OcrEngine;

/// Outcome of ingesting one document.
#[derive(Debug)]
pub struct IngestReport {
    pub source_name: String,
    pub chunks_added: usize,
    pub skipped_units: usize,
}

/// Ingest a document supplied as raw bytes plus its original filename.
///
/// The filename determines the format; its base name becomes the
/// `source_name` under which the document's chunks are grouped.
pub async fn ingest_bytes(
    store: &Arc<dyn CorpusStore>,
    ocr: &dyn OcrEngine,
    chunking: &ChunkingConfig,
    filename: &str,
    bytes: &[u8],
) -> Result<IngestReport> {
    let ext = extension_of(filename);
    let format = FileFormat::from_extension(&ext)?;

    let extracted = extract_text(bytes, format, ocr)?;
    let cleaned = clean_text(&extracted.text);
    if cleaned.is_empty() {
        return Err(Error::Extraction(format!(
            "no usable text extracted from {}",
            filename
        )));
    }

    let pieces = chunk_text(&cleaned, chunking.chunk_size, chunking.chunk_overlap)?;
    let total = pieces.len();
    let chunks: Vec<ChunkRecord> = pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| ChunkRecord {
            chunk_size: text.chars().count(),
            source: filename.to_string(),
            chunk_id: i,
            total_chunks: total,
            file_type: ext.clone(),
            text,
        })
        .collect();

    let source_name = base_name(filename);
    let chunks_added = store.append(chunks, &source_name).await?;
    info!(
        source = %source_name,
        chunks = chunks_added,
        "ingested document"
    );

    Ok(IngestReport {
        source_name,
        chunks_added,
        skipped_units: extracted.skipped_units,
    })
}

/// Ingest a document from the local filesystem.
pub async fn ingest_file(
    store: &Arc<dyn CorpusStore>,
    ocr: &dyn OcrEngine,
    chunking: &ChunkingConfig,
    path: &Path,
) -> Result<IngestReport> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Extraction(format!("read {}: {}", path.display(), e)))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Extraction(format!("invalid file name: {}", path.display())))?;
    ingest_bytes(store, ocr, chunking, filename, &bytes).await
}

/// Final path component of an upload's declared filename. Uploads may
/// carry client-side paths; only the base name identifies the document.
fn base_name(filename: &str) -> String {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .to_string()
}
