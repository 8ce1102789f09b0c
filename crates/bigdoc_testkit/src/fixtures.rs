//! Test fixtures and engine helpers.
//!
//! Provides convenience functions for setting up test engines
//! and common test records.

use bigdoc_core::{Config, PartStore, Record};
use bigdoc_store::InMemoryStore;
use serde_json::Value;
use std::sync::Arc;

/// An engine over a shared in-memory store.
///
/// The store handle is kept so tests can look at the physical layout.
pub struct TestEngine {
    /// The engine instance.
    pub engine: PartStore<Arc<InMemoryStore>>,
    /// The backing store.
    pub store: Arc<InMemoryStore>,
}

impl TestEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an engine with an explicit chunk ceiling.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self::with_config(Config::new().ceiling(ceiling))
    }

    /// Creates an engine with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(
            InMemoryStore::with_max_record_size(config.max_record_size)
                .with_metric(config.encoding.size_metric()),
        );
        let engine =
            PartStore::new(Arc::clone(&store), config).expect("Failed to create test engine");
        Self { engine, store }
    }

    /// Returns the ids in the parts sub-collection of a record.
    pub fn part_ids(&self, collection: &str, id: &str) -> Vec<String> {
        let sub = &self.engine.config().parts_subcollection;
        self.store
            .ids(&bigdoc_store::DocPath::child_collection(collection, id, sub))
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestEngine {
    type Target = PartStore<Arc<InMemoryStore>>;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

/// Runs a test with a fresh engine using the given ceiling.
///
/// # Example
///
/// ```rust
/// use bigdoc_testkit::with_engine;
///
/// with_engine(1_000, |engine| {
///     assert_eq!(engine.read("c", "missing").unwrap(), None);
/// });
/// ```
pub fn with_engine<F, R>(ceiling: usize, f: F) -> R
where
    F: FnOnce(&TestEngine) -> R,
{
    let engine = TestEngine::with_ceiling(ceiling);
    f(&engine)
}

/// Converts a JSON object into a record.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn record_from(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record must be a JSON object, got {other}"),
    }
}

/// Installs a test subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Test records.
pub mod scenarios {
    use super::*;
    use serde_json::json;

    /// A restaurant record with a small header and a large menu.
    pub fn restaurant(dishes: usize) -> Record {
        let menu: Vec<Value> = (0..dishes)
            .map(|i| {
                json!({
                    "id": i,
                    "name": format!("Dish number {i}"),
                    "description": "Slow-cooked with seasonal vegetables and herbs",
                    "price": i * 100 + 99,
                    "tags": ["house", "seasonal"]
                })
            })
            .collect();
        record_from(json!({
            "name": "Trattoria Bella",
            "city": "Torino",
            "seats": 48,
            "open": true,
            "menu": menu
        }))
    }

    /// A record of `count` fields, each holding `width` characters.
    pub fn wide(count: usize, width: usize) -> Record {
        (0..count)
            .map(|i| (format!("field_{i:04}"), Value::String("x".repeat(width))))
            .collect()
    }

    /// A record with one field holding `len` characters of `c`.
    pub fn single_text(name: &str, c: char, len: usize) -> Record {
        let mut record = Record::new();
        record.insert(name.to_string(), Value::String(c.to_string().repeat(len)));
        record
    }
}
