//! Fault injection for store-level testing.
//!
//! [`FaultyStore`] wraps any [`DocumentStore`] and can:
//! - fail a chosen primitive on its Nth call
//! - reorder the results of `list`
//! - plant a document right after a successful `atomic_delete`, standing in
//!   for a second writer that persists between another writer's cleanup and
//!   persist phases
//!
//! ## Usage
//!
//! ```rust
//! use bigdoc_testkit::fault::{FaultyStore, StoreOp};
//! use bigdoc_store::{DocumentStore, InMemoryStore};
//!
//! let store = FaultyStore::new(InMemoryStore::new());
//! store.fail_on(StoreOp::AtomicWrite, 1);
//! assert!(store.atomic_write(vec![]).is_err());
//! assert!(store.atomic_write(vec![]).is_ok());
//! ```

use bigdoc_store::{DocPath, DocumentStore, RawRecord, StoreError, StoreResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// The four store primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// `get`
    Get,
    /// `list`
    List,
    /// `atomic_write`
    AtomicWrite,
    /// `atomic_delete`
    AtomicDelete,
}

impl StoreOp {
    const ALL: [StoreOp; 4] = [Self::Get, Self::List, Self::AtomicWrite, Self::AtomicDelete];

    fn slot(self) -> usize {
        match self {
            Self::Get => 0,
            Self::List => 1,
            Self::AtomicWrite => 2,
            Self::AtomicDelete => 3,
        }
    }
}

/// A store wrapper that injects failures and interference.
pub struct FaultyStore<S: DocumentStore> {
    inner: S,
    calls: [AtomicUsize; 4],
    /// Call number (1-based) at which each op fails; 0 disables.
    fail_at: [AtomicUsize; 4],
    reverse_lists: AtomicBool,
    plant_after_delete: Mutex<Option<(DocPath, RawRecord)>>,
}

impl<S: DocumentStore> FaultyStore<S> {
    /// Wraps a store. No faults are armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Default::default(),
            fail_at: Default::default(),
            reverse_lists: AtomicBool::new(false),
            plant_after_delete: Mutex::new(None),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Makes the `nth` call of `op` from now on fail with
    /// [`StoreError::Unavailable`]. `nth` is 1-based.
    pub fn fail_on(&self, op: StoreOp, nth: usize) {
        let done = self.calls[op.slot()].load(Ordering::SeqCst);
        self.fail_at[op.slot()].store(done + nth, Ordering::SeqCst);
    }

    /// Makes `list` return its results in reverse order.
    pub fn reverse_lists(&self, reverse: bool) {
        self.reverse_lists.store(reverse, Ordering::SeqCst);
    }

    /// Writes `doc` at `path` into the wrapped store right after the next
    /// successful `atomic_delete`.
    pub fn plant_after_delete(&self, path: DocPath, doc: RawRecord) {
        *self.plant_after_delete.lock() = Some((path, doc));
    }

    /// Returns how many times `op` has been called.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls[op.slot()].load(Ordering::SeqCst)
    }

    /// Disarms all faults and resets call counters.
    pub fn reset(&self) {
        for op in StoreOp::ALL {
            self.calls[op.slot()].store(0, Ordering::SeqCst);
            self.fail_at[op.slot()].store(0, Ordering::SeqCst);
        }
        self.reverse_lists.store(false, Ordering::SeqCst);
        *self.plant_after_delete.lock() = None;
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        let n = self.calls[op.slot()].fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at[op.slot()].load(Ordering::SeqCst) == n {
            return Err(StoreError::unavailable(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<RawRecord>> {
        self.check(StoreOp::Get)?;
        self.inner.get(collection, id)
    }

    fn list(
        &self,
        collection: &str,
        id: &str,
        subcollection: &str,
    ) -> StoreResult<Vec<(String, RawRecord)>> {
        self.check(StoreOp::List)?;
        let mut docs = self.inner.list(collection, id, subcollection)?;
        if self.reverse_lists.load(Ordering::SeqCst) {
            docs.reverse();
        }
        Ok(docs)
    }

    fn atomic_write(&self, writes: Vec<(DocPath, RawRecord)>) -> StoreResult<()> {
        self.check(StoreOp::AtomicWrite)?;
        self.inner.atomic_write(writes)
    }

    fn atomic_delete(&self, paths: Vec<DocPath>) -> StoreResult<()> {
        self.check(StoreOp::AtomicDelete)?;
        self.inner.atomic_delete(paths)?;
        if let Some(planted) = self.plant_after_delete.lock().take() {
            self.inner.atomic_write(vec![planted])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdoc_store::InMemoryStore;

    #[test]
    fn test_faulty_store_normal_operation() {
        let store = FaultyStore::new(InMemoryStore::new());
        store
            .atomic_write(vec![(DocPath::new("c", "1"), RawRecord::new())])
            .unwrap();
        assert!(store.get("c", "1").unwrap().is_some());
        assert_eq!(store.calls(StoreOp::Get), 1);
        assert_eq!(store.calls(StoreOp::AtomicWrite), 1);
    }

    #[test]
    fn test_fail_on_nth_call() {
        let store = FaultyStore::new(InMemoryStore::new());
        store.fail_on(StoreOp::Get, 2);
        assert!(store.get("c", "1").is_ok());
        assert!(matches!(
            store.get("c", "1"),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.get("c", "1").is_ok());
    }

    #[test]
    fn test_plant_after_delete() {
        let store = FaultyStore::new(InMemoryStore::new());
        store.plant_after_delete(DocPath::new("c", "1"), RawRecord::new());
        store.atomic_delete(vec![DocPath::new("c", "1")]).unwrap();
        assert!(store.get("c", "1").unwrap().is_some());

        // only once
        store.atomic_delete(vec![DocPath::new("c", "1")]).unwrap();
        assert!(store.get("c", "1").unwrap().is_none());
    }

    #[test]
    fn test_reset() {
        let store = FaultyStore::new(InMemoryStore::new());
        store.fail_on(StoreOp::List, 1);
        store.reset();
        assert!(store.list("c", "1", "parts").is_ok());
    }
}
