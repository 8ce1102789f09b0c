//! # Bigdoc Core
//!
//! Oversized-record engine for Bigdoc.
//!
//! Document stores cap every document at a fixed size (about 1 MiB). This
//! crate stores logical records of any size on top of such a store by
//! spreading their fields over several part documents.
//!
//! This crate provides:
//! - Size estimation against the store's wire encoding (via `bigdoc_codec`)
//! - A [`Splitter`] for single fields larger than the chunk ceiling
//! - A [`Chunker`] packing fields greedily into chunks under the ceiling
//! - A [`PartWriter`] replacing a record's parts and manifest
//! - A [`Reassembler`] rebuilding the record from the current parts
//! - The [`PartStore`] facade tying them together
//!
//! ## Physical layout
//!
//! A logical record at `(collection, id)` becomes:
//! - a manifest document at `(collection, id)` carrying `isMultiPart`,
//!   `totalParts`, timestamps, a generation and a write token
//! - part documents in the sub-collection `"{collection}/{id}/parts"`, each
//!   holding whole fields, split descriptors and text fragments
//!
//! ## Example
//!
//! ```rust
//! use bigdoc_core::{Config, PartStore, Record};
//! use serde_json::json;
//!
//! let engine = PartStore::in_memory(Config::default()).unwrap();
//!
//! let mut record = Record::new();
//! record.insert("bio".into(), json!("y".repeat(2_000_000)));
//!
//! let receipt = engine.write("profiles", "p1", &record).unwrap();
//! // one descriptor part plus five fragments
//! assert_eq!(receipt.total_parts, 6);
//! assert_eq!(engine.read("profiles", "p1").unwrap(), Some(record));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod config;
mod engine;
mod error;
mod manifest;
mod part;
mod reader;
mod split;
mod types;
mod writer;

pub use chunk::{chunk_record, Chunker};
pub use config::{Config, WireEncoding};
pub use engine::PartStore;
pub use error::{
    CoreError, CoreResult, ReadError, ReadResult, ReconstructionError, WriteError, WriteResult,
};
pub use manifest::{Manifest, StoredRecord, BOOKKEEPING_KEYS};
pub use part::{Chunk, ChunkEntry, Fragment, FragmentMeta, Part, PartData, SplitKind};
pub use reader::{reassemble, Reassembler, RecordLayout};
pub use split::Splitter;
pub use types::{Generation, Record, WriteToken};
pub use writer::{PartWriter, WriteReceipt};
