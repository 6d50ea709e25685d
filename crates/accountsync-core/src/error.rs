//! Error types for account storage sync

use thiserror::Error;

use crate::types::StorageId;

/// Main error type for storage record translation
#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed wire bytes for a manifest, item or record envelope
    #[error("Decode error: {0}")]
    Decode(String),

    /// Decryption failed (wrong key, tampered data, or malformed input)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Cryptographic operation failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Invalid operation for the given value. Always a caller bug.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Attempted to write a record that carries no known variant
    #[error("Cannot write unknown record {0}")]
    UnknownRecordWrite(StorageId),

    /// A new manifest must have a strictly greater version than the previous one
    #[error("Manifest version {new} does not advance past {previous}")]
    VersionRegression {
        /// Version the remote store last acknowledged
        previous: u64,
        /// Version of the manifest being written
        new: u64,
    },
}

impl From<prost::DecodeError> for SyncError {
    fn from(err: prost::DecodeError) -> Self {
        SyncError::Decode(err.to_string())
    }
}

/// Result type alias using SyncError
pub type SyncResult<T> = Result<T, SyncError>;
