//! Golden test vectors for deterministic verification.
//!
//! Signature vectors are RFC 8032 section 7.1 tests 1 to 3. Credential
//! vectors pin the seed-phrase derivation so any port must agree on the
//! bytes.

use quill_core::{credentials::derive_seed, Credentials, Ed25519PublicKey, Ed25519Signature, Keypair};

/// An Ed25519 signing vector.
#[derive(Debug, Clone)]
pub struct SignatureVector {
    pub name: &'static str,
    /// Secret seed (hex).
    pub secret_key: &'static str,
    /// Public key (hex).
    pub public_key: &'static str,
    /// Message (hex).
    pub message: &'static str,
    /// Signature (hex).
    pub signature: &'static str,
}

/// A seed-phrase derivation vector.
#[derive(Debug, Clone)]
pub struct CredentialVector {
    pub seed_phrase: &'static str,
    /// PBKDF2 output (hex).
    pub seed: &'static str,
    /// Ed25519 public key (hex).
    pub signing_public_key: &'static str,
    /// X25519 public key (hex).
    pub encryption_public_key: &'static str,
}

pub fn signature_vectors() -> Vec<SignatureVector> {
    vec![
        SignatureVector {
            name: "RFC 8032 test 1 (empty message)",
            secret_key: "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
            public_key: "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
            message: "",
            signature: "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b",
        },
        SignatureVector {
            name: "RFC 8032 test 2 (one byte)",
            secret_key: "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb",
            public_key: "3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c",
            message: "72",
            signature: "92a009a9f0d4cab8720e820b5f642540a2b27b5416503f8fb3762223ebdb69da085ac1e43e15996e458f3613d0f11d8c387b2eaeb4302aeeb00d291612bb0c00",
        },
        SignatureVector {
            name: "RFC 8032 test 3 (two bytes)",
            secret_key: "c5aa8df43f9f837bedb7442f31dcb7b166d38535076f094b85ce3a2e0b4458f7",
            public_key: "fc51cd8e6218a1a38da47ed00230f0580816ed13ba3303ac5deb911548908025",
            message: "af82",
            signature: "6291d657deec24024827e69c3abe01a30ce548a284743a445e3680d7db5ac3ac18ff9b538d16f290ae67f760984dc6594a7c15e9716ed28dc027beceea1ec40a",
        },
    ]
}

pub fn credential_vectors() -> Vec<CredentialVector> {
    vec![
        CredentialVector {
            seed_phrase: "alpha",
            seed: "ebd11bc0581e26a660f84c294899ddd63b978bde968cd09116ee42d1fe7dd402",
            signing_public_key: "ace2bed63404676770f03eed5e5380f530b301e0b7d65cc79fbfbd4aed077aef",
            encryption_public_key: "94e11c60bead8b6b5e1f6af9ef4d9dd8cf207ca8e43be7c88b2d7c65fc429408",
        },
        CredentialVector {
            seed_phrase: "correct horse battery staple",
            seed: "20e3d4352c68fea7ec5d5cca58909e04194c3912cffa3c6c0da3b9537e7debe6",
            signing_public_key: "896d9e76fdb22f0102295dc103a3c92a428162200eeb40621cb945b5d3ce5651",
            encryption_public_key: "ebc66f7138e7393d3ca7925c3d428c375b034d55369af8149480af03f1bcdb30",
        },
    ]
}

fn hex_array<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected {} bytes, got {}", N, v.len()))
}

/// Check one signature vector: key derivation, signature bytes, verification.
pub fn verify_signature_vector(vector: &SignatureVector) -> Result<(), String> {
    let seed: [u8; 32] = hex_array(vector.secret_key)?;
    let message = hex::decode(vector.message).map_err(|e| e.to_string())?;
    let keypair = Keypair::from_seed(&seed);

    let expected_pk = Ed25519PublicKey::from_hex(vector.public_key).map_err(|e| e.to_string())?;
    if keypair.public_key() != expected_pk {
        return Err(format!("{}: public key mismatch", vector.name));
    }

    let signature = keypair.sign(&message);
    if signature.to_hex() != vector.signature {
        return Err(format!("{}: signature mismatch", vector.name));
    }

    let expected_sig = Ed25519Signature::from_bytes(hex_array(vector.signature)?);
    if !quill_core::verify(&message, &expected_sig, &expected_pk) {
        return Err(format!("{}: signature does not verify", vector.name));
    }
    Ok(())
}

/// Check one credential vector.
pub fn verify_credential_vector(vector: &CredentialVector) -> Result<(), String> {
    let seed = derive_seed(vector.seed_phrase);
    if hex::encode(*seed) != vector.seed {
        return Err(format!("{:?}: seed mismatch", vector.seed_phrase));
    }

    let credentials = Credentials::derive(vector.seed_phrase);
    if credentials.signing_public_key().to_hex() != vector.signing_public_key {
        return Err(format!("{:?}: signing key mismatch", vector.seed_phrase));
    }
    if hex::encode(credentials.encryption_public_key()) != vector.encryption_public_key {
        return Err(format!("{:?}: encryption key mismatch", vector.seed_phrase));
    }
    Ok(())
}

/// Check every vector, stopping at the first failure.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in signature_vectors() {
        verify_signature_vector(&vector)?;
    }
    for vector in credential_vectors() {
        verify_credential_vector(&vector)?;
    }
    Ok(())
}
