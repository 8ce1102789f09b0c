//! Wire encodings and size estimation.

use crate::error::{CodecError, CodecResult};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::io;

/// A wire encoding whose byte lengths the backing store charges against its
/// per-document limit.
///
/// Sizes are always the length of the real encoding, never a character
/// count, so multi-byte UTF-8 content is charged correctly.
pub trait Encoding: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Encodes a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialization`] if the value cannot be encoded.
    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>>;

    /// Returns the encoded size of a value in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialization`] if the value cannot be encoded.
    fn size_of(&self, value: &Value) -> CodecResult<usize>;

    /// Returns the encoded size of the single-entry map `{key: value}`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialization`] if the value cannot be encoded.
    fn size_of_entry(&self, key: &str, value: &Value) -> CodecResult<usize>;

    /// Returns an upper bound on the bytes one character occupies inside an
    /// encoded string.
    fn text_cost(&self, c: char) -> usize;
}

/// Compact JSON, the encoding managed document stores bill against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonEncoding;

/// CBOR, for stores that hold documents in a binary form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CborEncoding;

impl Encoding for JsonEncoding {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CodecError::serialization(e.to_string()))
    }

    fn size_of(&self, value: &Value) -> CodecResult<usize> {
        let mut counter = ByteCounter::default();
        serde_json::to_writer(&mut counter, value)
            .map_err(|e| CodecError::serialization(e.to_string()))?;
        Ok(counter.0)
    }

    fn size_of_entry(&self, key: &str, value: &Value) -> CodecResult<usize> {
        let mut counter = ByteCounter::default();
        serde_json::to_writer(&mut counter, &SingleEntry { key, value })
            .map_err(|e| CodecError::serialization(e.to_string()))?;
        Ok(counter.0)
    }

    fn text_cost(&self, c: char) -> usize {
        match c {
            '"' | '\\' | '\u{08}' | '\u{0c}' | '\n' | '\r' | '\t' => 2,
            '\u{00}'..='\u{1f}' => 6,
            _ => c.len_utf8(),
        }
    }
}

impl Encoding for CborEncoding {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(value, &mut buf)
            .map_err(|e| CodecError::serialization(e.to_string()))?;
        Ok(buf)
    }

    fn size_of(&self, value: &Value) -> CodecResult<usize> {
        let mut counter = ByteCounter::default();
        ciborium::ser::into_writer(value, &mut counter)
            .map_err(|e| CodecError::serialization(e.to_string()))?;
        Ok(counter.0)
    }

    fn size_of_entry(&self, key: &str, value: &Value) -> CodecResult<usize> {
        let mut counter = ByteCounter::default();
        ciborium::ser::into_writer(&SingleEntry { key, value }, &mut counter)
            .map_err(|e| CodecError::serialization(e.to_string()))?;
        Ok(counter.0)
    }

    fn text_cost(&self, c: char) -> usize {
        c.len_utf8()
    }
}

/// Serializes as the one-entry map `{key: value}` without cloning the value.
struct SingleEntry<'a> {
    key: &'a str,
    value: &'a Value,
}

impl Serialize for SingleEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, self.value)?;
        map.end()
    }
}

/// A writer that only counts the bytes it is given.
#[derive(Debug, Default)]
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
