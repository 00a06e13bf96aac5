//! # Quill Keys
//!
//! The diary key hierarchy.
//!
//! ## Overview
//!
//! Each diary owns one or more symmetric diary keys. The service stores them
//! only as sealed boxes addressed to the owning account's X25519 public key.
//! A [`KeyRing`] fetches those boxes from a [`KeySource`], opens them with the
//! account keypair, and caches the result per diary for a bounded time.
//!
//! ## Key Status
//!
//! - **active**: the key new writes must use
//! - **rotating**: an older key still needed to read existing records
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quill_keys::{KeyRing, KeyRingConfig, MemoryKeySource};
//! use quill_seal::EncryptionKeyPair;
//!
//! async fn example(account: EncryptionKeyPair) {
//!     let ring = KeyRing::new(MemoryKeySource::new(), account, KeyRingConfig::default());
//!     // let diary_key = ring.active_key(&diary_id).await?;
//! }
//! ```

pub mod error;
pub mod ring;
pub mod source;

pub use error::{KeyError, Result};
pub use ring::{DiaryKey, KeyRing, KeyRingConfig};
pub use source::{KeySource, KeyStatus, MemoryKeySource, SealedDiaryKey};
