//! # Quill Testkit
//!
//! Testing utilities for Quill.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: RFC 8032 signatures and seed-phrase derivations with
//!   known outputs
//! - **Generators**: Proptest strategies for keys and record fields
//! - **Fixtures**: Seeded accounts wired to an in-memory service
//! - **Service**: [`MemoryService`], an in-process diary service that stores
//!   only ciphertext and rejects unsigned or badly signed writes
//!
//! ## Golden Vectors
//!
//! ```rust
//! use quill_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().expect("vectors hold");
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use quill_testkit::fixtures::TestAccount;
//!
//! let account = TestAccount::new("alpha");
//! let client = account.client();
//! ```

pub mod fixtures;
pub mod generators;
pub mod service;
pub mod vectors;

pub use fixtures::TestAccount;
pub use service::MemoryService;
pub use vectors::{credential_vectors, signature_vectors, verify_all_vectors, CredentialVector, SignatureVector};
