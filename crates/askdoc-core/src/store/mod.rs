//! Corpus storage abstraction.
//!
//! The [`CorpusStore`] trait defines the operations the ingestion and
//! retrieval pipeline needs, enabling pluggable backends (the file-backed
//! JSON snapshot store in the application crate, in-memory for tests).
//!
//! The store is append-only for ingestion: records are immutable once
//! appended, deletion only removes whole documents sharing a
//! `source_name`, and `doc_id` values are never reassigned. Readers
//! operate on a snapshot, so any number of searches may run concurrently
//! with each other; writers are mutually exclusive with each other and
//! with snapshot construction.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChunkRecord, CorpusRecord};

/// Abstract corpus backend.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Append a document's chunks under `source_name`, assigning each a
    /// fresh strictly increasing `doc_id`. Returns the number appended.
    async fn append(&self, chunks: Vec<ChunkRecord>, source_name: &str) -> Result<usize>;

    /// A consistent snapshot of all records in insertion order.
    async fn snapshot(&self) -> Result<Vec<CorpusRecord>>;

    /// Remove every record ingested under `source_name`. Returns the
    /// number removed (zero when the name is unknown).
    async fn remove_source(&self, source_name: &str) -> Result<usize>;

    /// Remove all records.
    async fn clear(&self) -> Result<()>;

    /// Total number of stored records.
    async fn count(&self) -> Result<usize>;

    /// Distinct `source_name` values, in first-ingested order.
    async fn source_names(&self) -> Result<Vec<String>>;
}
