//! Error types for the seal module.

use thiserror::Error;

/// Errors from encryption, sealing, and the record codec.
#[derive(Debug, Error)]
pub enum SealError {
    /// AEAD tag did not verify: wrong key, tampered ciphertext, or a
    /// nonce/key mismatch.
    #[error("decryption error: authentication tag mismatch")]
    Decryption,

    /// Sealed box shorter than its ephemeral public key prefix.
    #[error("invalid sealed box: {len} bytes is shorter than the 32-byte prefix")]
    InvalidSealedBox { len: usize },

    /// Sealed box failed authentication.
    #[error("sealed box decryption failed")]
    DecryptionFailed,

    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decrypted key material had the wrong width.
    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    /// Field (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for seal operations.
pub type Result<T> = std::result::Result<T, SealError>;
