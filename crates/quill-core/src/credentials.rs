//! Account credentials derived from a seed phrase.
//!
//! A single 32-byte seed is stretched from the phrase with PBKDF2-HMAC-SHA256
//! and then used directly as both the Ed25519 signing seed and the X25519
//! private scalar. Keeping one secret is intentional; the two key types are
//! not domain-separated.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::signing::{Ed25519PublicKey, Keypair};

/// Fixed application salt for credential derivation.
pub const KDF_SALT: &[u8] = b"quill.credentials.v1";

/// PBKDF2 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;

/// The four-key bundle owned by an account.
///
/// Derived once per session and never transmitted. Secret halves are wiped
/// when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    encryption_public_key: [u8; 32],
    encryption_private_key: [u8; 32],
    signing_public_key: [u8; 32],
    signing_private_key: [u8; 32],
}

impl Credentials {
    /// Derive credentials from a seed phrase. Any string is accepted.
    pub fn derive(seed_phrase: &str) -> Self {
        let seed = derive_seed(seed_phrase);
        Self::from_seed(&seed)
    }

    /// Build credentials from an already-stretched 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing = Keypair::from_seed(seed);
        let encryption = StaticSecret::from(*seed);

        Self {
            encryption_public_key: PublicKey::from(&encryption).to_bytes(),
            encryption_private_key: encryption.to_bytes(),
            signing_public_key: *signing.public_key().as_bytes(),
            signing_private_key: signing.seed(),
        }
    }

    /// X25519 public key that diary keys are sealed to.
    pub fn encryption_public_key(&self) -> &[u8; 32] {
        &self.encryption_public_key
    }

    /// X25519 private scalar.
    pub fn encryption_private_key(&self) -> &[u8; 32] {
        &self.encryption_private_key
    }

    pub fn signing_public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey::from_bytes(self.signing_public_key)
    }

    /// Ed25519 private seed.
    pub fn signing_private_key(&self) -> &[u8; 32] {
        &self.signing_private_key
    }

    /// Rebuild the Ed25519 keypair.
    pub fn signing_keypair(&self) -> Keypair {
        Keypair::from_seed(&self.signing_private_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("signing", &self.signing_public_key())
            .field("encryption", &hex::encode(&self.encryption_public_key[..8]))
            .finish_non_exhaustive()
    }
}

/// Stretch a seed phrase into the 32-byte account seed.
pub fn derive_seed(seed_phrase: &str) -> Zeroizing<[u8; 32]> {
    let mut seed = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(seed_phrase.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut seed[..]);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = Credentials::derive("alpha");
        let b = Credentials::derive("alpha");

        assert_eq!(a.encryption_public_key(), b.encryption_public_key());
        assert_eq!(a.encryption_private_key(), b.encryption_private_key());
        assert_eq!(a.signing_public_key(), b.signing_public_key());
        assert_eq!(a.signing_private_key(), b.signing_private_key());
    }

    #[test]
    fn test_alpha_golden_vector() {
        let creds = Credentials::derive("alpha");

        assert_eq!(
            hex::encode(creds.signing_private_key()),
            "ebd11bc0581e26a660f84c294899ddd63b978bde968cd09116ee42d1fe7dd402"
        );
        assert_eq!(
            creds.signing_public_key().to_hex(),
            "ace2bed63404676770f03eed5e5380f530b301e0b7d65cc79fbfbd4aed077aef"
        );
        assert_eq!(
            hex::encode(creds.encryption_public_key()),
            "94e11c60bead8b6b5e1f6af9ef4d9dd8cf207ca8e43be7c88b2d7c65fc429408"
        );
    }

    #[test]
    fn test_seed_shared_by_both_key_types() {
        let creds = Credentials::derive("alpha");
        assert_eq!(creds.signing_private_key(), creds.encryption_private_key());
    }

    #[test]
    fn test_distinct_phrases_distinct_keys() {
        let a = Credentials::derive("alpha");
        let b = Credentials::derive("beta");

        assert_ne!(a.encryption_public_key(), b.encryption_public_key());
        assert_ne!(a.encryption_private_key(), b.encryption_private_key());
        assert_ne!(a.signing_public_key(), b.signing_public_key());
        assert_ne!(a.signing_private_key(), b.signing_private_key());
    }

    #[test]
    fn test_empty_phrase_accepted() {
        let creds = Credentials::derive("");
        let sig = creds.signing_keypair().sign(b"m");
        assert!(crate::verify(b"m", &sig, &creds.signing_public_key()));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = Credentials::derive("alpha");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains(&hex::encode(creds.signing_private_key())));
    }
}
