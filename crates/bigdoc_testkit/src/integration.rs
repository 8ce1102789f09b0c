//! Cross-crate integration test helpers.
//!
//! Provides utilities for testing the engine end to end against a store,
//! plus the scenario tests that exercise store, codec and core together.

use bigdoc_core::{PartStore, Record};
use bigdoc_store::DocumentStore;
use std::collections::HashMap;

/// Writes a record, reads it back and asserts it is unchanged.
///
/// # Panics
///
/// Panics if the write or read fails or the record comes back different.
pub fn assert_roundtrip<S: DocumentStore>(engine: &PartStore<S>, record: &Record) {
    engine
        .write("roundtrip", "r", record)
        .expect("Failed to write record");
    let actual = engine
        .read("roundtrip", "r")
        .expect("Failed to read record");
    assert_eq!(actual.as_ref(), Some(record), "record changed in round trip");
}

/// A test harness for integration testing.
///
/// Tracks what was written so every stored record can be verified later.
pub struct IntegrationHarness<S: DocumentStore> {
    /// The engine instance.
    pub engine: PartStore<S>,
    records: HashMap<(String, String), Record>,
}

impl<S: DocumentStore> IntegrationHarness<S> {
    /// Creates a harness around an engine.
    pub fn new(engine: PartStore<S>) -> Self {
        Self {
            engine,
            records: HashMap::new(),
        }
    }

    /// Writes a record and tracks it for later verification.
    pub fn write(&mut self, collection: &str, id: &str, record: Record) {
        self.engine
            .write(collection, id, &record)
            .expect("Failed to write record");
        self.records
            .insert((collection.to_string(), id.to_string()), record);
    }

    /// Reads a record and verifies it matches the tracked value.
    pub fn read_and_verify(&self, collection: &str, id: &str) -> Option<Record> {
        let actual = self
            .engine
            .read(collection, id)
            .expect("Failed to read record");
        let key = (collection.to_string(), id.to_string());
        assert_eq!(
            actual.as_ref(),
            self.records.get(&key),
            "record mismatch for {collection}/{id}"
        );
        actual
    }

    /// Deletes a record and updates tracking.
    pub fn delete(&mut self, collection: &str, id: &str) {
        self.engine
            .delete(collection, id)
            .expect("Failed to delete record");
        self.records
            .remove(&(collection.to_string(), id.to_string()));
    }

    /// Verifies all tracked records read back unchanged.
    pub fn verify_all(&self) {
        for (collection, id) in self.records.keys() {
            self.read_and_verify(collection, id);
        }
    }

    /// Returns the count of tracked records.
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }
}
