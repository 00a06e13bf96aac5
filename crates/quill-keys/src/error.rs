//! Error types for the key hierarchy.

use quill_core::{DiaryId, KeyId};
use thiserror::Error;

/// Errors that can occur while resolving diary keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key for the diary has status `active`.
    #[error("diary {0} has no active key")]
    NoActiveKey(DiaryId),

    /// The requested key id is not among the diary's keys.
    #[error("diary {diary_id} has no key {key_id}")]
    UnknownKey { diary_id: DiaryId, key_id: KeyId },

    /// A sealed diary key could not be opened.
    #[error("seal error: {0}")]
    Seal(#[from] quill_seal::SealError),

    /// The key source failed.
    #[error("key source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;
