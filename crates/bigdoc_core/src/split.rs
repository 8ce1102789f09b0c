//! Splitting of single oversized fields.

use crate::config::Config;
use crate::part::{Chunk, ChunkEntry, Fragment, FragmentMeta, SplitKind};
use bigdoc_codec::{to_canonical_string, CodecError, CodecResult, Encoding};
use serde_json::Value;

/// Breaks one oversized field into a descriptor chunk and fragment chunks.
///
/// Text is cut on character boundaries into fragments whose encoded cost is
/// at most the fragment budget (`ceiling / fragment_divisor`). For plain
/// ASCII that is exactly `budget` characters per fragment. Values that are
/// not strings are rendered to canonical text first and tagged
/// [`SplitKind::SplitJson`].
#[derive(Clone, Copy)]
pub struct Splitter {
    encoding: &'static dyn Encoding,
    ceiling: usize,
    budget: usize,
}

impl Splitter {
    /// Creates a splitter for the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: config.encoding.encoding(),
            ceiling: config.effective_ceiling(),
            budget: config.fragment_budget().max(1),
        }
    }

    /// Returns the fragment budget in encoded bytes.
    #[must_use]
    pub fn fragment_budget(&self) -> usize {
        self.budget
    }

    /// Splits `value` of field `name`.
    ///
    /// Returns the descriptor chunk followed by one chunk per fragment, in
    /// fragment order.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the value cannot be rendered as text, or if
    /// the field name alone is so long that the descriptor or a fragment
    /// chunk would not fit under the ceiling.
    pub fn split(&self, name: &str, value: &Value) -> CodecResult<Vec<Chunk>> {
        let kind;
        let rendered;
        let text = match value {
            Value::String(s) => {
                kind = SplitKind::SplitString;
                s.as_str()
            }
            other => {
                kind = SplitKind::SplitJson;
                rendered = to_canonical_string(other)?;
                rendered.as_str()
            }
        };

        let pieces = self.fragments(text);
        let parts = u32::try_from(pieces.len())
            .map_err(|_| CodecError::serialization(format!("field {name:?} needs too many fragments")))?;

        let meta = FragmentMeta {
            name: name.to_string(),
            split: kind,
            parts,
        };
        let meta_entry = ChunkEntry::FragmentMeta(meta.clone());
        let meta_value =
            serde_json::to_value(&meta).map_err(|e| CodecError::serialization(e.to_string()))?;
        let meta_size = self
            .encoding
            .size_of_entry(&meta_entry.legacy_key(), &meta_value)?;
        if meta_size > self.ceiling {
            return Err(CodecError::serialization(format!(
                "descriptor of field {name:?} is {meta_size} bytes, above the ceiling {}",
                self.ceiling
            )));
        }

        let mut chunks = Vec::with_capacity(pieces.len() + 1);
        chunks.push(Chunk::single(meta_entry, meta_size));

        for (index, piece) in (0u32..).zip(pieces) {
            let entry = ChunkEntry::Fragment(Fragment {
                name: name.to_string(),
                index,
                content: piece.to_string(),
            });
            let size = self
                .encoding
                .size_of_entry(&entry.legacy_key(), &Value::String(piece.to_string()))?;
            if size > self.ceiling {
                return Err(CodecError::serialization(format!(
                    "fragment {index} of field {name:?} is {size} bytes, above the ceiling {}",
                    self.ceiling
                )));
            }
            chunks.push(Chunk::single(entry, size));
        }

        tracing::debug!(
            field = name,
            kind = kind.as_str(),
            parts,
            budget = self.budget,
            "split oversized field"
        );
        Ok(chunks)
    }

    /// Cuts text into consecutive pieces of at most `budget` encoded bytes.
    ///
    /// Always returns at least one piece; a single character costing more
    /// than the budget becomes a piece of its own.
    fn fragments<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut cost = 0;
        for (i, c) in text.char_indices() {
            let c_cost = self.encoding.text_cost(c);
            if cost + c_cost > self.budget && i > start {
                pieces.push(&text[start..i]);
                start = i;
                cost = 0;
            }
            cost += c_cost;
        }
        pieces.push(&text[start..]);
        pieces
    }
}
