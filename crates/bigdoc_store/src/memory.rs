//! In-memory document store for testing.

use crate::error::{StoreError, StoreResult};
use crate::path::DocPath;
use crate::store::{DocumentStore, RawRecord};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Default hard per-document limit: 1 MiB, the ceiling of typical managed
/// document databases.
pub const DEFAULT_MAX_RECORD_SIZE: usize = 1024 * 1024;

type Collections = BTreeMap<String, BTreeMap<String, RawRecord>>;

/// The encoding a store charges document sizes against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeMetric {
    /// Compact JSON bytes.
    #[default]
    Json,
    /// CBOR bytes.
    Cbor,
}

/// An in-memory document store.
///
/// This store keeps every document in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral deployments that don't need persistence
///
/// Like a managed store it enforces a hard per-document size limit, measured
/// on the compact JSON encoding of the document unless another
/// [`SizeMetric`] is chosen. Batches are validated in full before anything
/// is applied.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use bigdoc_store::{DocPath, DocumentStore, InMemoryStore, RawRecord};
///
/// let store = InMemoryStore::with_max_record_size(64);
/// let mut big = RawRecord::new();
/// big.insert("blob".into(), "x".repeat(100).into());
///
/// assert!(store.atomic_write(vec![(DocPath::new("c", "1"), big)]).is_err());
/// assert_eq!(store.document_count(), 0);
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    collections: RwLock<Collections>,
    max_record_size: usize,
    metric: SizeMetric,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_max_record_size(DEFAULT_MAX_RECORD_SIZE)
    }
}

impl InMemoryStore {
    /// Creates a new empty store with the default 1 MiB document limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store with a custom document limit.
    #[must_use]
    pub fn with_max_record_size(max_record_size: usize) -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            max_record_size,
            metric: SizeMetric::Json,
        }
    }

    /// Sets the encoding documents are measured in.
    #[must_use]
    pub fn with_metric(mut self, metric: SizeMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Returns the hard per-document limit in bytes.
    #[must_use]
    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// Returns the encoding documents are measured in.
    #[must_use]
    pub fn metric(&self) -> SizeMetric {
        self.metric
    }

    /// Returns the total number of documents across all collections.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.collections.read().values().map(BTreeMap::len).sum()
    }

    /// Returns the ids of every document in a collection path, sorted.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Clears all documents from the store.
    pub fn clear(&self) {
        self.collections.write().clear();
    }

    fn check_size(&self, path: &DocPath, record: &RawRecord) -> StoreResult<()> {
        let size = match self.metric {
            SizeMetric::Json => serde_json::to_vec(record)
                .map_err(|e| StoreError::Corrupted(format!("{path}: {e}")))?
                .len(),
            SizeMetric::Cbor => {
                let mut buf = Vec::new();
                ciborium::ser::into_writer(record, &mut buf)
                    .map_err(|e| StoreError::Corrupted(format!("{path}: {e}")))?;
                buf.len()
            }
        };
        if size > self.max_record_size {
            return Err(StoreError::RecordTooLarge {
                path: path.to_string(),
                size,
                limit: self.max_record_size,
            });
        }
        Ok(())
    }
}

impl DocumentStore for InMemoryStore {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<RawRecord>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn list(
        &self,
        collection: &str,
        id: &str,
        subcollection: &str,
    ) -> StoreResult<Vec<(String, RawRecord)>> {
        let path = DocPath::child_collection(collection, id, subcollection);
        Ok(self
            .collections
            .read()
            .get(&path)
            .map(|docs| {
                docs.iter()
                    .map(|(doc_id, doc)| (doc_id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn atomic_write(&self, writes: Vec<(DocPath, RawRecord)>) -> StoreResult<()> {
        for (path, record) in &writes {
            self.check_size(path, record)?;
        }

        let mut collections = self.collections.write();
        for (path, record) in writes {
            collections
                .entry(path.collection)
                .or_default()
                .insert(path.id, record);
        }
        Ok(())
    }

    fn atomic_delete(&self, paths: Vec<DocPath>) -> StoreResult<()> {
        let mut collections = self.collections.write();
        for path in paths {
            if let Some(docs) = collections.get_mut(&path.collection) {
                docs.remove(&path.id);
                if docs.is_empty() {
                    collections.remove(&path.collection);
                }
            }
        }
        Ok(())
    }
}
