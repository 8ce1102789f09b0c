//! Engine facade.

use crate::chunk::Chunker;
use crate::config::Config;
use crate::error::{CoreResult, ReadResult, WriteResult};
use crate::part::Chunk;
use crate::reader::{Reassembler, RecordLayout};
use crate::types::Record;
use crate::writer::{PartWriter, WriteReceipt};
use bigdoc_codec::CodecResult;
use bigdoc_store::{DocumentStore, InMemoryStore};

/// The main engine handle.
///
/// `PartStore` stores logical records of any size in a document store whose
/// documents are capped at a fixed size. Records that fit are still written
/// as a manifest plus one part, so every record written by the engine has
/// the same layout.
///
/// # Example
///
/// ```rust
/// use bigdoc_core::{Config, PartStore, Record};
/// use bigdoc_store::InMemoryStore;
/// use serde_json::json;
///
/// let engine = PartStore::new(InMemoryStore::new(), Config::new().ceiling(200)).unwrap();
///
/// let mut record = Record::new();
/// record.insert("name".into(), json!("Osteria"));
/// record.insert("menu".into(), json!("antipasti ".repeat(100)));
///
/// let receipt = engine.write("restaurants", "r1", &record).unwrap();
/// assert!(receipt.total_parts > 1);
/// assert_eq!(engine.read("restaurants", "r1").unwrap(), Some(record));
/// ```
///
/// # Concurrency
///
/// Reads may run concurrently with anything. Writes to the same record id
/// must be serialized by the caller; a write that detects another writer
/// between its cleanup and persist phases fails with
/// [`crate::WriteError::Conflict`].
pub struct PartStore<S: DocumentStore> {
    store: S,
    config: Config,
}

impl<S: DocumentStore> PartStore<S> {
    /// Creates an engine over a store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] if the configuration is
    /// unusable.
    pub fn new(store: S, config: Config) -> CoreResult<Self> {
        config.validate()?;
        tracing::debug!(
            ceiling = config.effective_ceiling(),
            fragment_budget = config.fragment_budget(),
            encoding = config.encoding.encoding().name(),
            "opened part store"
        );
        Ok(Self { store, config })
    }

    /// Creates an engine with the default configuration.
    ///
    /// # Errors
    ///
    /// Never fails with the default configuration; the result mirrors
    /// [`Self::new`].
    pub fn with_defaults(store: S) -> CoreResult<Self> {
        Self::new(store, Config::default())
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Writes a logical record, replacing whatever was stored before.
    ///
    /// # Errors
    ///
    /// See [`PartWriter::write`].
    pub fn write(&self, collection: &str, id: &str, record: &Record) -> WriteResult<WriteReceipt> {
        PartWriter::new(&self.store, &self.config).write(collection, id, record)
    }

    /// Reads a logical record. Returns `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::read`].
    pub fn read(&self, collection: &str, id: &str) -> ReadResult<Option<Record>> {
        Reassembler::new(&self.store, &self.config).read(collection, id)
    }

    /// Deletes a logical record and all of its parts.
    ///
    /// # Errors
    ///
    /// See [`PartWriter::delete`].
    pub fn delete(&self, collection: &str, id: &str) -> WriteResult<bool> {
        PartWriter::new(&self.store, &self.config).delete(collection, id)
    }

    /// Describes how a record is laid out in the store.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::inspect`].
    pub fn inspect(&self, collection: &str, id: &str) -> ReadResult<Option<RecordLayout>> {
        Reassembler::new(&self.store, &self.config).inspect(collection, id)
    }

    /// Removes parts left behind by interrupted or superseded writes.
    ///
    /// # Errors
    ///
    /// See [`PartWriter::collect_garbage`].
    pub fn collect_garbage(&self, collection: &str, id: &str) -> WriteResult<usize> {
        PartWriter::new(&self.store, &self.config).collect_garbage(collection, id)
    }

    /// Returns the chunks a record would be written as, without touching
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the record cannot be serialized.
    pub fn plan(&self, record: &Record) -> CodecResult<Vec<Chunk>> {
        Chunker::new(&self.config).chunk(record)
    }
}

impl PartStore<InMemoryStore> {
    /// Creates an engine over a fresh in-memory store for testing.
    ///
    /// The store's hard limit and size metric are taken from the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] if the configuration is
    /// unusable.
    pub fn in_memory(config: Config) -> CoreResult<Self> {
        let store = InMemoryStore::with_max_record_size(config.max_record_size)
            .with_metric(config.encoding.size_metric());
        Self::new(store, config)
    }
}

impl<S: DocumentStore> std::fmt::Debug for PartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use serde_json::json;

    fn create_engine(ceiling: usize) -> PartStore<InMemoryStore> {
        PartStore::in_memory(Config::new().ceiling(ceiling)).unwrap()
    }

    #[test]
    fn invalid_config_rejected() {
        let result = PartStore::new(InMemoryStore::new(), Config::new().fragment_divisor(0));
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn write_read_delete() {
        let engine = create_engine(100);
        let mut record = Record::new();
        record.insert("title".into(), json!("Cucina"));
        record.insert("story".into(), json!("s".repeat(1_000)));

        engine.write("r", "1", &record).unwrap();
        assert_eq!(engine.read("r", "1").unwrap(), Some(record));
        assert!(engine.delete("r", "1").unwrap());
        assert_eq!(engine.read("r", "1").unwrap(), None);
        assert_eq!(engine.store().document_count(), 0);
    }

    #[test]
    fn plan_matches_write() {
        let engine = create_engine(100);
        let mut record = Record::new();
        record.insert("story".into(), json!("s".repeat(1_000)));
        let planned = engine.plan(&record).unwrap();
        let receipt = engine.write("r", "1", &record).unwrap();
        assert_eq!(planned.len(), receipt.total_parts as usize);
        assert_eq!(engine.store().document_count(), planned.len() + 1);
    }

    #[test]
    fn inspect_reports_layout() {
        let engine = create_engine(100);
        assert_eq!(engine.inspect("r", "1").unwrap(), None);

        let mut record = Record::new();
        record.insert("story".into(), json!("s".repeat(1_000)));
        let receipt = engine.write("r", "1", &record).unwrap();

        let layout = engine.inspect("r", "1").unwrap().unwrap();
        assert_eq!(layout.current_parts, receipt.total_parts as usize);
        assert_eq!(layout.stale_parts, 0);
        assert_eq!(layout.direct_fields, None);
        assert_eq!(
            layout.manifest.map(|m| m.generation),
            Some(receipt.generation)
        );
    }
}
