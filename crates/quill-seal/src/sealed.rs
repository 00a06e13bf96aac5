//! Anonymous public-key sealing.
//!
//! A sealed box delivers a diary key to an account using only the account's
//! long-lived X25519 public key. Each call generates a fresh ephemeral
//! keypair, so the sender is anonymous and repeated seals of the same data
//! never produce the same bytes.
//!
//! Layout: `ephemeral_public_key (32) || XSalsa20-Poly1305 ciphertext`.
//! The 24-byte box nonce is not transmitted; both sides derive it as the
//! first 24 bytes of `SHA-512(ephemeral_public_key || recipient_public_key)`.

use crypto_box::aead::Aead;
use crypto_box::{Nonce, PublicKey, SalsaBox, SecretKey};
use rand::RngCore;
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use quill_core::base64_serde;

use crate::crypto::{X25519PublicKey, X25519StaticSecret, KEY_LEN};
use crate::error::{Result, SealError};

/// Width of the box nonce derived from the two public keys.
const BOX_NONCE_LEN: usize = 24;

/// A sealed box: ephemeral public key followed by the box ciphertext.
///
/// Serializes as a single base64 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox(pub Vec<u8>);

base64_serde!(SealedBox);

impl SealedBox {
    /// Wrap raw sealed-box bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The ephemeral public key prefix, if the box is long enough to have one.
    pub fn ephemeral_public_key(&self) -> Option<X25519PublicKey> {
        let prefix: [u8; KEY_LEN] = self.0.get(..KEY_LEN)?.try_into().ok()?;
        Some(X25519PublicKey::from_bytes(prefix))
    }

    /// Open this box. See [`unseal`].
    pub fn open(
        &self,
        recipient_secret: &X25519StaticSecret,
        recipient_public: &X25519PublicKey,
    ) -> Result<Vec<u8>> {
        unseal(&self.0, recipient_secret, recipient_public)
    }
}

/// Seal `data` so only the holder of `recipient`'s private key can open it.
pub fn seal(data: &[u8], recipient: &X25519PublicKey) -> Result<SealedBox> {
    let mut ephemeral_bytes = [0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut ephemeral_bytes);
    let ephemeral = SecretKey::from(ephemeral_bytes);
    ephemeral_bytes.zeroize();

    let ephemeral_public = ephemeral.public_key();
    let nonce = box_nonce(ephemeral_public.as_bytes(), recipient.as_bytes());

    let salsa_box = SalsaBox::new(&PublicKey::from(recipient.0), &ephemeral);
    let ciphertext = salsa_box
        .encrypt(&nonce, data)
        .map_err(|e| SealError::Encryption(format!("seal failed: {e}")))?;

    let mut out = Vec::with_capacity(KEY_LEN + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(SealedBox(out))
}

/// Open a sealed box with the recipient's keypair.
///
/// Fails with [`SealError::InvalidSealedBox`] if the input cannot hold an
/// ephemeral public key, and [`SealError::DecryptionFailed`] if the box does
/// not authenticate under this keypair.
pub fn unseal(
    sealed: &[u8],
    recipient_secret: &X25519StaticSecret,
    recipient_public: &X25519PublicKey,
) -> Result<Vec<u8>> {
    if sealed.len() < KEY_LEN {
        return Err(SealError::InvalidSealedBox { len: sealed.len() });
    }

    let (prefix, ciphertext) = sealed.split_at(KEY_LEN);
    let mut ephemeral_bytes = [0u8; KEY_LEN];
    ephemeral_bytes.copy_from_slice(prefix);

    let nonce = box_nonce(&ephemeral_bytes, recipient_public.as_bytes());

    let mut secret_bytes = recipient_secret.to_bytes();
    let secret = SecretKey::from(secret_bytes);
    secret_bytes.zeroize();

    let salsa_box = SalsaBox::new(&PublicKey::from(ephemeral_bytes), &secret);
    salsa_box
        .decrypt(&nonce, ciphertext)
        .map_err(|_| SealError::DecryptionFailed)
}

fn box_nonce(ephemeral_public: &[u8; KEY_LEN], recipient_public: &[u8; KEY_LEN]) -> Nonce {
    let mut hasher = Sha512::new();
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    let digest = hasher.finalize();
    Nonce::clone_from_slice(&digest[..BOX_NONCE_LEN])
}
