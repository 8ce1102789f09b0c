//! Chunks, parts and their payload entries.
//!
//! A [`Chunk`] is the in-memory output of the chunker: an ordered list of
//! tagged [`ChunkEntry`] values. A [`Part`] is a chunk as stored, stamped
//! with its index and the write that produced it.
//!
//! On the wire a part's payload groups entries by tag:
//!
//! ```text
//! {
//!   "fields":    { "<name>": <value>, ... },
//!   "splits":    [ { "originalKey": "<name>", "type": "split_string", "parts": N } ],
//!   "fragments": [ { "name": "<name>", "index": i, "content": "..." } ]
//! }
//! ```
//!
//! Field names only ever appear under `fields`, so a field that happens to be
//! called `bio_metadata` or `bio_part_3` is stored like any other.

use crate::error::{CoreError, CoreResult};
use crate::types::{Generation, Record, WriteToken};
use bigdoc_store::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a split field is reassembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// Concatenated fragments are the original string.
    SplitString,
    /// Concatenated fragments are the canonical text of a structured value.
    SplitJson,
}

impl SplitKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SplitString => "split_string",
            Self::SplitJson => "split_json",
        }
    }
}

/// Descriptor of a split field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMeta {
    /// The original field name.
    #[serde(rename = "originalKey")]
    pub name: String,
    /// How to reassemble.
    #[serde(rename = "type")]
    pub split: SplitKind,
    /// Total number of fragments.
    pub parts: u32,
}

/// One contiguous piece of a split field's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// The original field name.
    pub name: String,
    /// Position of this fragment, 0-based.
    pub index: u32,
    /// The fragment text.
    pub content: String,
}

/// One entry of a chunk payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEntry {
    /// A top-level field stored verbatim.
    Field {
        /// Field name.
        name: String,
        /// Field value.
        value: Value,
    },
    /// Descriptor of a split field.
    FragmentMeta(FragmentMeta),
    /// A fragment of a split field.
    Fragment(Fragment),
}

impl ChunkEntry {
    /// Returns the name of the logical field this entry belongs to.
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::Field { name, .. } => name,
            Self::FragmentMeta(meta) => &meta.name,
            Self::Fragment(fragment) => &fragment.name,
        }
    }

    /// Returns the flat key this entry would have under the `K_metadata` /
    /// `K_part_{i}` naming convention. Used for size accounting and logs.
    #[must_use]
    pub fn legacy_key(&self) -> String {
        match self {
            Self::Field { name, .. } => name.clone(),
            Self::FragmentMeta(meta) => format!("{}_metadata", meta.name),
            Self::Fragment(fragment) => format!("{}_part_{}", fragment.name, fragment.index),
        }
    }
}

/// A size-bounded group of entries destined for one part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    entries: Vec<ChunkEntry>,
    size: usize,
}

impl Chunk {
    /// Creates an empty chunk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chunk holding a single entry of the given accounted size.
    #[must_use]
    pub fn single(entry: ChunkEntry, size: usize) -> Self {
        Self {
            entries: vec![entry],
            size,
        }
    }

    /// Adds an entry and its accounted size.
    pub fn push(&mut self, entry: ChunkEntry, size: usize) {
        self.entries.push(entry);
        self.size += size;
    }

    /// Returns the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[ChunkEntry] {
        &self.entries
    }

    /// Returns the accounted size: the sum of the entry sizes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chunk has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the chunk into its wire payload.
    #[must_use]
    pub fn to_data(&self) -> PartData {
        let mut data = PartData::default();
        for entry in &self.entries {
            match entry {
                ChunkEntry::Field { name, value } => {
                    data.fields.insert(name.clone(), value.clone());
                }
                ChunkEntry::FragmentMeta(meta) => data.splits.push(meta.clone()),
                ChunkEntry::Fragment(fragment) => data.fragments.push(fragment.clone()),
            }
        }
        data
    }
}

/// The wire payload of a part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartData {
    /// Fields stored verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: Record,
    /// Split-field descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<FragmentMeta>,
    /// Split-field fragments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<Fragment>,
}

impl PartData {
    /// Returns the payload as tagged entries: fields, then descriptors, then
    /// fragments.
    #[must_use]
    pub fn into_entries(self) -> Vec<ChunkEntry> {
        let fields = self
            .fields
            .into_iter()
            .map(|(name, value)| ChunkEntry::Field { name, value });
        let splits = self.splits.into_iter().map(ChunkEntry::FragmentMeta);
        let fragments = self.fragments.into_iter().map(ChunkEntry::Fragment);
        fields.chain(splits).chain(fragments).collect()
    }
}

/// A stored part: one chunk of one write of a logical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Position of this part, 0-based and dense.
    pub part_index: u32,
    /// Generation of the write that produced this part.
    pub generation: Generation,
    /// Token of the write that produced this part.
    pub write_token: WriteToken,
    /// The chunk payload.
    pub data: PartData,
}

impl Part {
    /// Returns the document id of the part with the given token and index.
    ///
    /// Ids sort by index within one write.
    #[must_use]
    pub fn document_id(token: &WriteToken, index: u32) -> String {
        format!("{token}-{index:06}")
    }

    /// Returns this part's document id.
    #[must_use]
    pub fn id(&self) -> String {
        Self::document_id(&self.write_token, self.part_index)
    }

    /// Returns true if this part was produced by the given write.
    #[must_use]
    pub fn belongs_to(&self, generation: Generation, token: &WriteToken) -> bool {
        self.generation == generation && &self.write_token == token
    }

    /// Encodes the part as a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value cannot be serialized.
    pub fn to_raw(&self) -> CoreResult<RawRecord> {
        match serde_json::to_value(self)
            .map_err(|e| bigdoc_codec::CodecError::serialization(e.to_string()))?
        {
            Value::Object(map) => Ok(map),
            _ => Err(CoreError::invalid_part("part did not encode as an object")),
        }
    }

    /// Decodes a part from a store document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPart`] if the document is not a part.
    pub fn from_raw(raw: RawRecord) -> CoreResult<Self> {
        serde_json::from_value(Value::Object(raw)).map_err(|e| CoreError::invalid_part(e.to_string()))
    }
}
