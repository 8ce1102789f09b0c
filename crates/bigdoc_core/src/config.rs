//! Engine configuration.

use crate::error::{CoreError, CoreResult};
use crate::manifest::Manifest;
use crate::part::{ChunkEntry, Fragment, FragmentMeta, Part, PartData, SplitKind};
use crate::types::{Generation, Record, WriteToken};
use bigdoc_codec::{CborEncoding, CodecError, Encoding, JsonEncoding};
use bigdoc_store::{SizeMetric, DEFAULT_MAX_RECORD_SIZE};
use serde_json::Value;

/// Wire encoding the backing store charges document sizes against.
///
/// Chunks are sized in this encoding, so it must match how the store
/// measures documents: a CBOR-sized chunk can be larger as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireEncoding {
    /// Compact JSON.
    #[default]
    Json,
    /// CBOR. Requires a store that charges CBOR bytes.
    Cbor,
}

impl WireEncoding {
    /// Returns the size estimator for this encoding.
    #[must_use]
    pub fn encoding(self) -> &'static dyn Encoding {
        match self {
            Self::Json => &JsonEncoding,
            Self::Cbor => &CborEncoding,
        }
    }

    /// Returns the metric an [`bigdoc_store::InMemoryStore`] must use to
    /// charge documents the way chunks are sized.
    #[must_use]
    pub fn size_metric(self) -> SizeMetric {
        match self {
            Self::Json => SizeMetric::Json,
            Self::Cbor => SizeMetric::Cbor,
        }
    }
}

/// Configuration for a [`crate::PartStore`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Hard per-document limit of the backing store, in bytes.
    pub max_record_size: usize,

    /// Fraction of `max_record_size` used as the chunk ceiling when no
    /// explicit ceiling is set.
    pub ceiling_ratio: f64,

    /// Explicit chunk ceiling in bytes, overriding `ceiling_ratio`.
    pub ceiling: Option<usize>,

    /// Fragments of a split field are at most `ceiling / fragment_divisor`
    /// encoded bytes.
    pub fragment_divisor: usize,

    /// Name of the sub-collection holding the parts of a record.
    pub parts_subcollection: String,

    /// Encoding used for size estimation.
    pub encoding: WireEncoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_record_size: DEFAULT_MAX_RECORD_SIZE, // 1 MiB
            ceiling_ratio: 0.9,
            ceiling: None,
            fragment_divisor: 2,
            parts_subcollection: "parts".to_string(),
            encoding: WireEncoding::Json,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backing store's hard per-document limit.
    #[must_use]
    pub fn max_record_size(mut self, size: usize) -> Self {
        self.max_record_size = size;
        self
    }

    /// Sets the ceiling as a fraction of the hard limit.
    #[must_use]
    pub fn ceiling_ratio(mut self, ratio: f64) -> Self {
        self.ceiling_ratio = ratio;
        self
    }

    /// Sets an explicit chunk ceiling in bytes.
    #[must_use]
    pub fn ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Sets the fragment divisor.
    #[must_use]
    pub fn fragment_divisor(mut self, divisor: usize) -> Self {
        self.fragment_divisor = divisor;
        self
    }

    /// Sets the parts sub-collection name.
    #[must_use]
    pub fn parts_subcollection(mut self, name: impl Into<String>) -> Self {
        self.parts_subcollection = name.into();
        self
    }

    /// Sets the wire encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: WireEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns the chunk ceiling `C` in bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn effective_ceiling(&self) -> usize {
        self.ceiling
            .unwrap_or_else(|| (self.max_record_size as f64 * self.ceiling_ratio).floor() as usize)
    }

    /// Returns the encoded-byte budget of one fragment.
    #[must_use]
    pub fn fragment_budget(&self) -> usize {
        self.effective_ceiling() / self.fragment_divisor.max(1)
    }

    /// Returns the most bytes a stored part adds on top of the accounted
    /// size of its chunk: the index, generation and token stamps plus the
    /// payload wrapper, measured with every stamp at its widest.
    ///
    /// # Errors
    ///
    /// Returns a codec error if a sample part cannot be encoded.
    pub fn part_overhead(&self) -> CoreResult<usize> {
        let encoding = self.encoding.encoding();
        let envelope = |data: PartData, accounted: usize| -> CoreResult<usize> {
            let part = Part {
                part_index: u32::MAX,
                generation: Generation::new(u64::MAX),
                write_token: WriteToken::new(),
                data,
            };
            let size = encoding.size_of(&Value::Object(part.to_raw()?))?;
            Ok(size.saturating_sub(accounted))
        };

        let mut fields = Record::new();
        fields.insert(String::new(), Value::Null);
        let field = envelope(
            PartData {
                fields,
                ..PartData::default()
            },
            encoding.size_of_entry("", &Value::Null)?,
        )?;

        // Field names count twice in a descriptor's accounted size and once
        // on the wire, so the empty name is the widest case.
        let meta = FragmentMeta {
            name: String::new(),
            split: SplitKind::SplitString,
            parts: u32::MAX,
        };
        let meta_value =
            serde_json::to_value(&meta).map_err(|e| CodecError::serialization(e.to_string()))?;
        let meta_key = ChunkEntry::FragmentMeta(meta.clone()).legacy_key();
        let descriptor = envelope(
            PartData {
                splits: vec![meta],
                ..PartData::default()
            },
            encoding.size_of_entry(&meta_key, &meta_value)?,
        )?;

        let fragment = Fragment {
            name: String::new(),
            index: 0,
            content: String::new(),
        };
        let fragment_key = ChunkEntry::Fragment(fragment.clone()).legacy_key();
        let piece = envelope(
            PartData {
                fragments: vec![fragment],
                ..PartData::default()
            },
            encoding.size_of_entry(&fragment_key, &Value::String(String::new()))?,
        )?;

        Ok(field.max(descriptor).max(piece))
    }

    /// Returns the encoded size of the widest manifest this engine writes.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the manifest cannot be encoded.
    pub fn manifest_size(&self) -> CoreResult<usize> {
        let manifest = Manifest {
            is_multi_part: true,
            total_parts: u32::MAX,
            created_at: u64::MAX,
            last_updated: u64::MAX,
            generation: Generation::new(u64::MAX),
            write_token: Some(WriteToken::new()),
        };
        let size = self
            .encoding
            .encoding()
            .size_of(&Value::Object(manifest.to_raw()?))?;
        Ok(size)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.ceiling.is_none() && !(self.ceiling_ratio > 0.0 && self.ceiling_ratio <= 1.0) {
            return Err(CoreError::invalid_config(format!(
                "ceiling ratio must be in (0, 1], got {}",
                self.ceiling_ratio
            )));
        }
        if self.fragment_divisor == 0 {
            return Err(CoreError::invalid_config("fragment divisor must be non-zero"));
        }
        let ceiling = self.effective_ceiling();
        if ceiling == 0 {
            return Err(CoreError::invalid_config("ceiling must be non-zero"));
        }
        if ceiling > self.max_record_size {
            return Err(CoreError::invalid_config(format!(
                "ceiling {ceiling} exceeds the store limit {}",
                self.max_record_size
            )));
        }
        let overhead = self.part_overhead()?;
        if ceiling.saturating_add(overhead) > self.max_record_size {
            return Err(CoreError::invalid_config(format!(
                "ceiling {ceiling} plus part overhead {overhead} exceeds the store limit {}",
                self.max_record_size
            )));
        }
        let manifest = self.manifest_size()?;
        if manifest > self.max_record_size {
            return Err(CoreError::invalid_config(format!(
                "manifest of {manifest} bytes exceeds the store limit {}",
                self.max_record_size
            )));
        }
        if self.fragment_budget() == 0 {
            return Err(CoreError::invalid_config(format!(
                "fragment budget is zero (ceiling {ceiling}, divisor {})",
                self.fragment_divisor
            )));
        }
        if self.parts_subcollection.is_empty() || self.parts_subcollection.contains('/') {
            return Err(CoreError::invalid_config(format!(
                "invalid parts sub-collection name {:?}",
                self.parts_subcollection
            )));
        }
        Ok(())
    }
}
