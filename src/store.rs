//! The current feedback dataset.
//!
//! Uploads publish a whole new generation of records; readers take a cheap
//! `Arc` snapshot and keep it for the rest of their request, so a question
//! in flight never sees a half-replaced dataset.

use crate::models::FeedbackRecord;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::info;

/// Errors reading an ingestion hand-off file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read records file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse records file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Shared handle to the current record set. Clones share the same dataset.
#[derive(Debug, Clone)]
pub struct RecordStore {
    current: Arc<RwLock<Arc<[FeedbackRecord]>>>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::from(Vec::new()))),
        }
    }

    /// Replace the dataset wholesale.
    pub fn replace(&self, records: Vec<FeedbackRecord>) {
        let generation: Arc<[FeedbackRecord]> = Arc::from(records);
        let count = generation.len();

        // Neither side panics while holding the lock, so a poisoned lock
        // still guards a complete generation.
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = generation;

        info!("Record store now holds {} records", count);
    }

    /// The generation current at the time of the call.
    pub fn snapshot(&self) -> Arc<[FeedbackRecord]> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// True until the first non-empty upload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records in the current generation.
    pub fn len(&self) -> usize {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Load the records ingestion wrote out as a JSON array.
pub fn load_records(path: &Path) -> Result<Vec<FeedbackRecord>, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn records(n: usize) -> Vec<FeedbackRecord> {
        (0..n)
            .map(|i| FeedbackRecord::new("2024-01-01", "Crate", Some("5"), &format!("entry {}", i)))
            .collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert_eq!(store.snapshot().len(), 0);
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = RecordStore::new();
        store.replace(records(3));
        store.replace(records(2));

        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot()[1].feedback, "entry 1");
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = RecordStore::new();
        store.replace(records(4));

        let in_flight = store.snapshot();
        store.replace(records(1));

        assert_eq!(in_flight.len(), 4);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_clones_share_dataset() {
        let store = RecordStore::new();
        let handle = store.clone();
        store.replace(records(2));
        assert_eq!(handle.len(), 2);
    }

    #[test]
    fn test_load_records() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"Response Date": "2024-05-01", "Brand": "CB2", "Digital CSAT": "3", "Feedback": "Slow shipping"}}]"#
        )
        .unwrap();

        let loaded = load_records(file.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].brand, "CB2");
        assert_eq!(loaded[0].csat_score(), Some(3.0));
    }

    #[test]
    fn test_load_records_errors() {
        let missing = load_records(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(StoreError::Read { .. })));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let invalid = load_records(file.path());
        assert!(matches!(invalid, Err(StoreError::Parse { .. })));
    }
}
