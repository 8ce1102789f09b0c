//! # Bigdoc Codec
//!
//! Wire-size estimation and canonical text encoding for Bigdoc.
//!
//! This crate answers one question for the rest of the engine: how many
//! bytes will the backing store charge for this value? Estimates are the
//! length of the actual encoding:
//! - [`JsonEncoding`] - compact JSON, the default
//! - [`CborEncoding`] - CBOR via `ciborium`
//!
//! It also provides the canonical text form used to split structured values
//! and the parser that reverses it.
//!
//! ## Usage
//!
//! ```
//! use bigdoc_codec::{Encoding, JsonEncoding};
//! use serde_json::json;
//!
//! // {"bio":"héllo"} is 16 bytes: 'é' takes two.
//! let size = JsonEncoding.size_of_entry("bio", &json!("héllo")).unwrap();
//! assert_eq!(size, 16);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod canonical;
mod encoding;
mod error;

pub use canonical::{from_canonical_string, to_canonical_string};
pub use encoding::{CborEncoding, Encoding, JsonEncoding};
pub use error::{CodecError, CodecResult};
pub use serde_json::Value;

/// Returns the compact JSON size of a value.
///
/// # Errors
///
/// Returns an error if the value cannot be encoded.
pub fn size_of(value: &Value) -> CodecResult<usize> {
    JsonEncoding.size_of(value)
}

/// Returns the compact JSON size of the single-entry map `{key: value}`.
///
/// # Errors
///
/// Returns an error if the value cannot be encoded.
pub fn size_of_entry(key: &str, value: &Value) -> CodecResult<usize> {
    JsonEncoding.size_of_entry(key, value)
}
