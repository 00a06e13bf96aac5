//! # Quill Seal
//!
//! Authenticated encryption and the record envelope.
//!
//! ## Encryption Model
//!
//! Every record is protected by a two-tier key model:
//!
//! 1. **Entity Key**: A fresh symmetric key (ChaCha20-Poly1305) generated on
//!    every write. It encrypts the record's fields and is then discarded.
//! 2. **Diary Key**: A long-lived symmetric key per diary. It wraps each
//!    entity key, and is itself delivered to the owning account as a
//!    [`SealedBox`] under the account's X25519 public key.
//!
//! ## Usage
//!
//! ```rust
//! use quill_seal::{wrap_record, unwrap_record, SymmetricKey};
//! use serde_json::json;
//!
//! let diary_key = SymmetricKey::generate();
//! let wrapped = wrap_record(&json!({ "title": "t" }), &diary_key).unwrap();
//! let fields: serde_json::Value = unwrap_record(&wrapped, &diary_key).unwrap();
//! assert_eq!(fields, json!({ "title": "t" }));
//! ```

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod record;
pub mod sealed;

pub use crypto::{AeadNonce, EncryptionKeyPair, SymmetricKey, X25519PublicKey, X25519StaticSecret};
pub use envelope::Envelope;
pub use error::{Result, SealError};
pub use record::{unwrap_preview, unwrap_record, wrap_record, RecordSealer, WrappedRecord};
pub use sealed::{seal, unseal, SealedBox};
