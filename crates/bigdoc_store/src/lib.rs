//! # Bigdoc Store
//!
//! Document store abstraction for Bigdoc.
//!
//! This crate provides the lowest-level boundary of the engine: a keyed
//! document store with a hard per-document size ceiling. Stores are
//! **opaque document holders** - they do not interpret manifests, parts or
//! fragments.
//!
//! ## Design Principles
//!
//! - Four primitives only: get, list a sub-collection, atomic batch write,
//!   atomic batch delete
//! - Each primitive is atomic on its own; two calls are never jointly atomic
//! - Must be `Send + Sync` for concurrent access
//! - Bigdoc owns all record layout interpretation
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use bigdoc_store::{DocPath, DocumentStore, InMemoryStore, RawRecord};
//! use serde_json::json;
//!
//! let store = InMemoryStore::new();
//! let mut doc = RawRecord::new();
//! doc.insert("name".into(), json!("Trattoria"));
//!
//! store.atomic_write(vec![(DocPath::new("menus", "m1"), doc.clone())]).unwrap();
//! assert_eq!(store.get("menus", "m1").unwrap(), Some(doc));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod path;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, SizeMetric, DEFAULT_MAX_RECORD_SIZE};
pub use path::DocPath;
pub use store::{DocumentStore, RawRecord};
