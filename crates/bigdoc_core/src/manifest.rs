//! Record manifest.
//!
//! The manifest lives at the logical record's own `(collection, id)` and
//! says how the record is stored. A document there without
//! `isMultiPart: true` is a record stored directly, without splitting.

use crate::error::{CoreError, CoreResult};
use crate::types::{now_millis, Generation, Record, WriteToken};
use bigdoc_store::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Manifest keys that are bookkeeping, not record content.
pub const BOOKKEEPING_KEYS: [&str; 6] = [
    "isMultiPart",
    "totalParts",
    "createdAt",
    "lastUpdated",
    "generation",
    "writeToken",
];

/// Manifest of a multi-part record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Always true for manifests written by this engine.
    pub is_multi_part: bool,
    /// Number of parts; part indices are exactly `0..total_parts`.
    pub total_parts: u32,
    /// When the record was first written, in epoch milliseconds.
    pub created_at: u64,
    /// When the record was last written, in epoch milliseconds.
    pub last_updated: u64,
    /// Generation of the write that produced the current parts.
    #[serde(default)]
    pub generation: Generation,
    /// Token of the write that produced the current parts. Absent on
    /// manifests written before write tokens existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_token: Option<WriteToken>,
}

impl Manifest {
    /// Creates the manifest for a new write.
    ///
    /// `previous` is the manifest being replaced, if any: its creation time
    /// is kept and its generation is advanced.
    #[must_use]
    pub fn for_write(total_parts: u32, token: WriteToken, previous: Option<&Manifest>) -> Self {
        let now = now_millis();
        Self {
            is_multi_part: true,
            total_parts,
            created_at: previous.map_or(now, |m| m.created_at),
            last_updated: now,
            generation: previous.map_or(Generation::new(1), |m| m.generation.next()),
            write_token: Some(token),
        }
    }

    /// Encodes the manifest as a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_raw(&self) -> CoreResult<RawRecord> {
        match serde_json::to_value(self)
            .map_err(|e| bigdoc_codec::CodecError::serialization(e.to_string()))?
        {
            Value::Object(map) => Ok(map),
            _ => Err(CoreError::invalid_manifest("manifest did not encode as an object")),
        }
    }
}

/// What is stored at a logical record's `(collection, id)`.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRecord {
    /// The record is stored directly; bookkeeping keys already removed.
    Direct(Record),
    /// The record is split into parts described by this manifest.
    MultiPart(Manifest),
}

impl StoredRecord {
    /// Interprets the document found at a record's `(collection, id)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidManifest`] if the document claims to be a
    /// multi-part manifest but is malformed.
    pub fn from_raw(mut raw: RawRecord) -> CoreResult<Self> {
        match raw.get("isMultiPart") {
            Some(Value::Bool(true)) => serde_json::from_value(Value::Object(raw))
                .map(Self::MultiPart)
                .map_err(|e| CoreError::invalid_manifest(e.to_string())),
            Some(Value::Bool(false)) | None => {
                for key in BOOKKEEPING_KEYS {
                    raw.remove(key);
                }
                Ok(Self::Direct(raw))
            }
            Some(other) => Err(CoreError::invalid_manifest(format!(
                "isMultiPart must be a boolean, got {other}"
            ))),
        }
    }

    /// Returns the manifest if the record is multi-part.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            Self::MultiPart(manifest) => Some(manifest),
            Self::Direct(_) => None,
        }
    }
}
