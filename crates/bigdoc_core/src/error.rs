//! Error types for Bigdoc core.

use bigdoc_codec::CodecError;
use bigdoc_store::StoreError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for the write path.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for the read path.
pub type ReadResult<T> = Result<T, ReadError>;

/// Errors from configuration and from decoding stored documents.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A manifest document could not be decoded.
    #[error("invalid manifest: {message}")]
    InvalidManifest {
        /// Description of the problem.
        message: String,
    },

    /// A part document could not be decoded.
    #[error("invalid part: {message}")]
    InvalidPart {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid manifest error.
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            message: message.into(),
        }
    }

    /// Creates an invalid part error.
    pub fn invalid_part(message: impl Into<String>) -> Self {
        Self::InvalidPart {
            message: message.into(),
        }
    }
}

/// Errors that can occur while writing a logical record.
#[derive(Debug, Error)]
pub enum WriteError {
    /// A value could not be serialized. Raised before any store call;
    /// nothing was mutated.
    #[error("serialization failed: {0}")]
    Serialization(#[from] CodecError),

    /// A store call failed before anything was mutated.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Cleanup succeeded but persisting the new parts failed. The record is
    /// now absent; the caller must retry the whole write.
    #[error("partial write of {path}: old parts removed, persist failed: {source}")]
    PartialWrite {
        /// The logical record.
        path: String,
        /// The failure of the persist phase.
        #[source]
        source: StoreError,
    },

    /// Another writer persisted the same record between cleanup and
    /// persist. This write was abandoned.
    #[error("concurrent write detected on {path}")]
    Conflict {
        /// The logical record.
        path: String,
    },

    /// The record's own document could not be decoded.
    #[error("corrupt document {path}: {source}")]
    Corrupt {
        /// The offending document.
        path: String,
        /// The decoding failure.
        #[source]
        source: CoreError,
    },
}

impl From<CoreError> for WriteError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Codec(e) => Self::Serialization(e),
            CoreError::Store(e) => Self::Store(e),
            other => Self::Serialization(CodecError::serialization(other.to_string())),
        }
    }
}

/// Errors that can occur while reading a logical record.
#[derive(Debug, Error)]
pub enum ReadError {
    /// A store call failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A manifest or part document could not be decoded.
    #[error("corrupt document {path}: {source}")]
    Corrupt {
        /// The offending document.
        path: String,
        /// The decoding failure.
        #[source]
        source: CoreError,
    },

    /// The parts do not reassemble into a record.
    #[error("reconstruction failed: {0}")]
    Reconstruction(#[from] ReconstructionError),
}

/// Reasons a set of parts cannot be reassembled.
///
/// No best-effort partial record is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructionError {
    /// The number of current parts differs from the manifest.
    #[error("manifest records {expected} parts, found {found}")]
    PartCount {
        /// Parts recorded in the manifest.
        expected: u32,
        /// Parts present for the manifest's write.
        found: usize,
    },

    /// A part index in `[0, totalParts)` is missing.
    #[error("part {index} is missing")]
    MissingPart {
        /// The missing index.
        index: u32,
    },

    /// Two parts carry the same index.
    #[error("part {index} is present more than once")]
    DuplicatePart {
        /// The duplicated index.
        index: u32,
    },

    /// A field appears in more than one place.
    #[error("field {field:?} is stored more than once")]
    DuplicateField {
        /// The field name.
        field: String,
    },

    /// A split field has more than one descriptor.
    #[error("split field {field:?} has more than one descriptor")]
    DuplicateSplit {
        /// The field name.
        field: String,
    },

    /// A fragment index is present more than once.
    #[error("fragment {index} of {field:?} is present more than once")]
    DuplicateFragment {
        /// The field name.
        field: String,
        /// The duplicated index.
        index: u32,
    },

    /// The number of fragments differs from the descriptor.
    #[error("split field {field:?} records {expected} fragments, found {found}")]
    FragmentCount {
        /// The field name.
        field: String,
        /// Fragments recorded in the descriptor.
        expected: u32,
        /// Fragments present.
        found: usize,
    },

    /// A fragment slot below the recorded count is empty.
    #[error("fragment {index} of {field:?} is missing")]
    MissingFragment {
        /// The field name.
        field: String,
        /// The missing index.
        index: u32,
    },

    /// Fragments exist for a field that has no descriptor.
    #[error("fragments of {field:?} have no descriptor")]
    OrphanFragment {
        /// The field name.
        field: String,
    },

    /// The concatenated fragments of a structured field do not parse.
    #[error("split field {field:?} does not parse: {message}")]
    InvalidJson {
        /// The field name.
        field: String,
        /// The parse failure.
        message: String,
    },
}
