//! # Quill
//!
//! Client-side end-to-end encryption for a diary service.
//!
//! ## Overview
//!
//! The server only ever stores ciphertext. This crate turns a seed phrase
//! into account keys, unlocks diary keys sealed to the account, and reads and
//! writes records in a two-tier envelope:
//!
//! - **Credentials**: PBKDF2 over the seed phrase yields one seed used as
//!   both the Ed25519 signing key and the X25519 encryption key
//! - **Diary keys**: symmetric keys sealed to the account's public key, one
//!   `active` per diary, older ones kept for reading
//! - **Records**: fields encrypted under a fresh entity key, which is itself
//!   encrypted under the diary key
//! - **Signing**: every mutating request carries an Ed25519 signature over
//!   its body in `X-Signature`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quill::{ClientConfig, Credentials, DiaryClient, RecordKind, RecordSealer};
//! use serde_json::json;
//!
//! async fn example() -> quill::Result<()> {
//!     let credentials = Credentials::derive("correct horse battery staple");
//!     let config = ClientConfig::with_base_url("https://diary.example").api_token("token");
//!     let client = DiaryClient::connect(config, &credentials)?;
//!
//!     let diary = client.create_diary(&json!({ "title": "Travel" })).await?;
//!     let sealer = RecordSealer::new(&json!({ "title": "Day 1", "body": "..." }))?
//!         .preview(&json!({ "title": "Day 1" }))?;
//!     let entry = client.create_record(RecordKind::Entry, &diary, sealer).await?;
//!
//!     let record = client
//!         .get_record::<serde_json::Value>(RecordKind::Entry, &diary, &entry)
//!         .await?;
//!     println!("{}", record.details["title"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `quill::core` - Credentials, signing, identifiers
//! - `quill::seal` - AEAD envelopes, sealed boxes, the record codec
//! - `quill::keys` - Diary key resolution and caching

pub mod client;
pub mod config;
pub mod error;
pub mod records;
pub mod signer;
pub mod transport;

// Re-export component crates
pub use quill_core as core;
pub use quill_keys as keys;
pub use quill_seal as seal;

// Re-export main types for convenience
pub use client::{ApiKeySource, DiaryClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use records::{CreatedDiary, CreatedRecord, DeleteRecord, EncryptedRecord, NewDiary, Record, RecordKind};
pub use signer::{RequestSigner, SignedRequest, SIGNATURE_HEADER};
pub use transport::{ApiRequest, ErrorBody, HttpTransport, Method, Transport};

// Re-export commonly used component types
pub use quill_core::{Credentials, DiaryId, KeyId, RecordId};
pub use quill_keys::{KeyRingConfig, KeyStatus, SealedDiaryKey};
pub use quill_seal::{Envelope, RecordSealer, SealedBox, SymmetricKey, WrappedRecord};
