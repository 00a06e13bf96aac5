//! Cryptographic utilities for the seal module.
//!
//! Provides X25519 account keys and ChaCha20-Poly1305 authenticated encryption.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use quill_core::{base64_serde, Credentials};

use crate::error::{Result, SealError};

/// Width of every symmetric and X25519 key.
pub const KEY_LEN: usize = 32;

/// Width of the AEAD nonce.
pub const NONCE_LEN: usize = 12;

/// Width of the Poly1305 tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// An X25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct X25519PublicKey(pub [u8; 32]);

base64_serde!(X25519PublicKey);

impl X25519PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

/// An X25519 static secret key.
///
/// Only for key agreement; signing uses the Ed25519 half of the credentials.
#[derive(Clone)]
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let secret = Self(StaticSecret::from(bytes));
        bytes.zeroize();
        secret
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Get the raw scalar bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Derive the public key.
    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(PublicKey::from(&self.0))
    }
}

/// The account's X25519 keypair. Diary keys are sealed to `public` and
/// opened with `secret`.
#[derive(Clone)]
pub struct EncryptionKeyPair {
    pub secret: X25519StaticSecret,
    pub public: X25519PublicKey,
}

impl EncryptionKeyPair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        let secret = X25519StaticSecret::generate();
        let public = secret.public_key();
        Self { secret, public }
    }

    /// The encryption half of account credentials.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let secret = X25519StaticSecret::from_bytes(*credentials.encryption_private_key());
        let public = X25519PublicKey::from_bytes(*credentials.encryption_public_key());
        Self { secret, public }
    }
}

impl fmt::Debug for EncryptionKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// A 256-bit symmetric key for ChaCha20-Poly1305.
///
/// Used for both diary keys and per-write entity keys.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        let key = Self(bytes);
        bytes.zeroize();
        key
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| SealError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt data with this key.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &AeadNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| SealError::Encryption(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| SealError::Encryption(e.to_string()))
    }

    /// Decrypt data with this key.
    ///
    /// Fails closed: any tag mismatch yields [`SealError::Decryption`] and no
    /// plaintext.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &AeadNonce) -> Result<Vec<u8>> {
        let cipher =
            ChaCha20Poly1305::new_from_slice(&self.0).map_err(|_| SealError::Decryption)?;

        let nonce = Nonce::from_slice(&nonce.0);
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| SealError::Decryption)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AeadNonce(pub [u8; NONCE_LEN]);

base64_serde!(AeadNonce);

impl AeadNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let nonce = AeadNonce::generate();
        let plaintext = b"hello, world!";

        let ciphertext = key.encrypt(plaintext, &nonce).unwrap();
        assert_ne!(&ciphertext[..plaintext.len()], plaintext);
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let decrypted = key.decrypt(&ciphertext, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();
        let nonce = AeadNonce::generate();

        let ciphertext = key1.encrypt(b"secret", &nonce).unwrap();

        assert!(matches!(
            key2.decrypt(&ciphertext, &nonce),
            Err(SealError::Decryption)
        ));
    }

    #[test]
    fn test_decrypt_wrong_nonce_fails() {
        let key = SymmetricKey::generate();
        let ciphertext = key.encrypt(b"secret", &AeadNonce::generate()).unwrap();

        assert!(matches!(
            key.decrypt(&ciphertext, &AeadNonce::generate()),
            Err(SealError::Decryption)
        ));
    }

    #[test]
    fn test_from_slice_length_checked() {
        assert!(SymmetricKey::from_slice(&[0u8; 32]).is_ok());
        assert!(matches!(
            SymmetricKey::from_slice(&[0u8; 31]),
            Err(SealError::InvalidKeyLength(31))
        ));
    }

    #[test]
    fn test_keypair_from_credentials() {
        let credentials = Credentials::from_seed(&[0x24; 32]);
        let keypair = EncryptionKeyPair::from_credentials(&credentials);

        assert_eq!(keypair.public, keypair.secret.public_key());
        assert_eq!(keypair.public.as_bytes(), credentials.encryption_public_key());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = SymmetricKey::from_bytes([0xab; 32]);
        assert_eq!(format!("{key:?}"), "SymmetricKey(..)");
    }

    #[test]
    fn test_nonce_width() {
        let nonce = AeadNonce::generate();
        assert_eq!(nonce.as_bytes().len(), NONCE_LEN);

        let json = serde_json::to_value(nonce).unwrap();
        let raw = quill_core::encoding::decode(json.as_str().unwrap()).unwrap();
        assert_eq!(raw.len(), NONCE_LEN);

        let short = serde_json::json!(quill_core::encoding::encode([0u8; NONCE_LEN - 1]));
        assert!(serde_json::from_value::<AeadNonce>(short).is_err());
    }
}
