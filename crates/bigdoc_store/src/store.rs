//! Document store trait definition.

use crate::error::StoreResult;
use crate::path::DocPath;

/// A raw document as held by the backing store.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// A backing document store for Bigdoc.
///
/// Stores are **opaque document holders**. They provide four primitives and
/// nothing else. Bigdoc owns the interpretation of manifests and parts.
///
/// # Invariants
///
/// - `get` returns exactly the document last written at that path
/// - `atomic_write` either applies every write in the batch or none
/// - `atomic_delete` either removes every listed document or none;
///   missing documents are not an error
/// - Two separate calls are never jointly atomic
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
pub trait DocumentStore: Send + Sync {
    /// Fetches a single document.
    ///
    /// Returns `Ok(None)` if no document exists at the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<RawRecord>>;

    /// Fetches every document in the sub-collection `subcollection` of the
    /// document `(collection, id)`, together with their document ids.
    ///
    /// No ordering is guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    fn list(
        &self,
        collection: &str,
        id: &str,
        subcollection: &str,
    ) -> StoreResult<Vec<(String, RawRecord)>>;

    /// Writes (creates or replaces) a batch of documents atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any document is rejected (for example because it
    /// exceeds the store's size limit) or the store cannot be reached. On
    /// error nothing is written.
    fn atomic_write(&self, writes: Vec<(DocPath, RawRecord)>) -> StoreResult<()>;

    /// Deletes a batch of documents atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached. On error nothing is
    /// deleted.
    fn atomic_delete(&self, paths: Vec<DocPath>) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<RawRecord>> {
        (**self).get(collection, id)
    }

    fn list(
        &self,
        collection: &str,
        id: &str,
        subcollection: &str,
    ) -> StoreResult<Vec<(String, RawRecord)>> {
        (**self).list(collection, id, subcollection)
    }

    fn atomic_write(&self, writes: Vec<(DocPath, RawRecord)>) -> StoreResult<()> {
        (**self).atomic_write(writes)
    }

    fn atomic_delete(&self, paths: Vec<DocPath>) -> StoreResult<()> {
        (**self).atomic_delete(paths)
    }
}
