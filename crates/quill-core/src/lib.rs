//! # Quill Core
//!
//! Pure primitives for Quill: account credentials, Ed25519 signing, and the
//! base64 wire encoding shared by every crate in the workspace.
//!
//! This crate contains no I/O and no networking.
//!
//! ## Key Types
//!
//! - [`Credentials`] - The four-key bundle derived from a seed phrase
//! - [`Keypair`] - Ed25519 signing keypair
//! - [`Ed25519PublicKey`] / [`Ed25519Signature`] - Fixed-width signing types
//!
//! ## Credential Derivation
//!
//! ```rust
//! use quill_core::Credentials;
//!
//! let credentials = Credentials::derive("correct horse battery staple");
//! let signature = credentials.signing_keypair().sign(b"hello");
//! assert!(quill_core::verify(b"hello", &signature, &credentials.signing_public_key()));
//! ```

pub mod credentials;
pub mod encoding;
pub mod error;
pub mod signing;
pub mod types;

pub use credentials::{Credentials, KDF_ITERATIONS, KDF_SALT};
pub use error::{CoreError, Result};
pub use signing::{sign, verify, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use types::{DiaryId, KeyId, RecordId};
