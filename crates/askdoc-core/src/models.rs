//! Core data models used throughout askdoc.
//!
//! These types represent the chunks, corpus records, and scored results
//! that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// A chunk produced by the ingestion pipeline, before the store assigns
/// its document id. Immutable once created.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Cleaned chunk text.
    pub text: String,
    /// Base name of the originating file.
    pub source: String,
    /// Ordinal index of this chunk within its document.
    pub chunk_id: usize,
    /// Total number of chunks the document produced.
    pub total_chunks: usize,
    /// Declared file extension (e.g. `.pdf`).
    pub file_type: String,
    /// Character length of `text`.
    pub chunk_size: usize,
}

/// Provenance metadata persisted alongside every corpus record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
    pub chunk_id: usize,
    pub total_chunks: usize,
    pub file_type: String,
    pub chunk_size: usize,
    /// Upload name the record was ingested under; removal is by this key.
    pub source_name: String,
    /// Strictly increasing id assigned at append time, never reused.
    pub doc_id: u64,
}

/// A persisted chunk plus its provenance metadata. Append-only: records
/// are never mutated after insertion, and removal only happens wholesale
/// per `source_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub text: String,
    pub metadata: RecordMetadata,
}

/// A corpus record paired with its relevance score in `[0, max_score]`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    pub record: CorpusRecord,
    pub score: f64,
}

impl ChunkRecord {
    /// Attach store-assigned identity, producing the persisted form.
    pub fn into_record(self, source_name: &str, doc_id: u64) -> CorpusRecord {
        CorpusRecord {
            text: self.text,
            metadata: RecordMetadata {
                source: self.source,
                chunk_id: self.chunk_id,
                total_chunks: self.total_chunks,
                file_type: self.file_type,
                chunk_size: self.chunk_size,
                source_name: source_name.to_string(),
                doc_id,
            },
        }
    }
}
