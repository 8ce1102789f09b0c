//! Canonical text form of structured values.
//!
//! Split fields that are not strings are turned into text before being cut
//! into fragments, and parsed back after the fragments are concatenated.

use crate::error::{CodecError, CodecResult};
use serde_json::Value;

/// Renders a value as compact JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the value cannot be rendered.
pub fn to_canonical_string(value: &Value) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|e| CodecError::serialization(e.to_string()))
}

/// Parses text produced by [`to_canonical_string`].
///
/// # Errors
///
/// Returns [`CodecError::Parse`] if the text is not valid JSON.
pub fn from_canonical_string(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::parse(e.to_string()))
}
