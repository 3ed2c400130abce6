//! In-memory [`CorpusStore`] implementation for tests and embedding.
//!
//! A `Vec` of records behind `std::sync::RwLock`; the doc-id counter lives
//! under the same lock so appends assign ids atomically with insertion.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChunkRecord, CorpusRecord};

use super::CorpusStore;

struct Inner {
    records: Vec<CorpusRecord>,
    next_doc_id: u64,
}

/// In-memory corpus store.
pub struct InMemoryCorpus {
    inner: RwLock<Inner>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Vec::new(),
                next_doc_id: 0,
            }),
        }
    }
}

impl Default for InMemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpus {
    async fn append(&self, chunks: Vec<ChunkRecord>, source_name: &str) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let appended = chunks.len();
        for chunk in chunks {
            let doc_id = inner.next_doc_id;
            inner.next_doc_id += 1;
            inner.records.push(chunk.into_record(source_name, doc_id));
        }
        Ok(appended)
    }

    async fn snapshot(&self) -> Result<Vec<CorpusRecord>> {
        Ok(self.inner.read().unwrap().records.clone())
    }

    async fn remove_source(&self, source_name: &str) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let before = inner.records.len();
        inner
            .records
            .retain(|r| r.metadata.source_name != source_name);
        Ok(before - inner.records.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.records.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().unwrap().records.len())
    }

    async fn source_names(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        let mut names: Vec<String> = Vec::new();
        for record in &inner.records {
            if !names.contains(&record.metadata.source_name) {
                names.push(record.metadata.source_name.clone());
            }
        }
        Ok(names)
    }
}
