//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A value could not be converted to the wire format.
    #[error("serialization failed: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// Text could not be parsed back into a structured value.
    #[error("parse failed: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
    },
}

impl CodecError {
    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() || err.is_data() {
            Self::parse(err.to_string())
        } else {
            Self::serialization(err.to_string())
        }
    }
}
