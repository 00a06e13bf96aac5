//! AEAD envelope.
//!
//! An [`Envelope`] is the nonce and ciphertext produced by one encryption
//! call. It is the at-rest and on-the-wire shape for every encrypted blob:
//! wrapped entity keys, record details, and previews.

use serde::{Deserialize, Serialize};

use crate::crypto::{AeadNonce, SymmetricKey};
use crate::error::Result;

/// An encrypted blob and the nonce needed to open it.
///
/// Serializes as `{"nonce": "<base64>", "ciphertext": "<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Nonce used for encryption (unique per encryption).
    pub nonce: AeadNonce,

    /// The encrypted data (includes authentication tag).
    #[serde(with = "quill_core::encoding::b64")]
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt plaintext under `key` with a freshly generated nonce.
    pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Result<Self> {
        let nonce = AeadNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;

        Ok(Self { nonce, ciphertext })
    }

    /// Decrypt with the given key.
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<Vec<u8>> {
        key.decrypt(&self.ciphertext, &self.nonce)
    }

    /// Get the size of the ciphertext.
    pub fn ciphertext_len(&self) -> usize {
        self.ciphertext.len()
    }
}
