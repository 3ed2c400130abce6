//! JSON-file backed [`CorpusStore`].
//!
//! The whole corpus lives in memory behind an `RwLock`; every mutation
//! rewrites the snapshot file in full. Suited to the personal-scale corpora
//! this service targets (hundreds of documents, not millions).

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use askdoc_core::models::{ChunkRecord, CorpusRecord};
use askdoc_core::store::CorpusStore;
use askdoc_core::{Error, Result};

#[derive(Serialize, Deserialize)]
struct Snapshot {
    records: Vec<CorpusRecord>,
}

struct Inner {
    records: Vec<CorpusRecord>,
    next_doc_id: u64,
}

/// Corpus store persisted as a single pretty-printed JSON file.
pub struct JsonCorpusStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl JsonCorpusStore {
    /// Open the store at `path`, loading any existing snapshot.
    ///
    /// An unreadable or corrupt snapshot logs a warning and starts the
    /// store empty instead of refusing to serve; the broken file is only
    /// overwritten on the next successful mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match load_snapshot(&path) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load corpus snapshot, starting empty");
                Vec::new()
            }
        };
        let next_doc_id = records
            .iter()
            .map(|r| r.metadata.doc_id + 1)
            .max()
            .unwrap_or(0);
        if !records.is_empty() {
            info!(
                path = %path.display(),
                records = records.len(),
                "loaded corpus snapshot"
            );
        }
        Self {
            path,
            inner: RwLock::new(Inner {
                records,
                next_doc_id,
            }),
        }
    }

    fn persist(&self, records: &[CorpusRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Persistence(format!("create {}: {}", parent.display(), e)))?;
            }
        }
        let snapshot = Snapshot {
            records: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::Persistence(format!("serialize corpus: {}", e)))?;
        std::fs::write(&self.path, json)
            .map_err(|e| Error::Persistence(format!("write {}: {}", self.path.display(), e)))
    }
}

fn load_snapshot(path: &Path) -> Result<Vec<CorpusRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Persistence(format!("read {}: {}", path.display(), e)))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .map_err(|e| Error::Persistence(format!("parse {}: {}", path.display(), e)))?;
    Ok(snapshot.records)
}

#[async_trait]
impl CorpusStore for JsonCorpusStore {
    async fn append(&self, chunks: Vec<ChunkRecord>, source_name: &str) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let appended = chunks.len();
        for chunk in chunks {
            let doc_id = inner.next_doc_id;
            inner.next_doc_id += 1;
            inner.records.push(chunk.into_record(source_name, doc_id));
        }
        self.persist(&inner.records)?;
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
        let removed = before - inner.records.len();
        if removed > 0 {
            self.persist(&inner.records)?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.records.clear();
        self.persist(&inner.records)
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
