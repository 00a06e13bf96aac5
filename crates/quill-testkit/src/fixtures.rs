//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use quill::{ClientConfig, DiaryClient};
use quill_core::Credentials;
use quill_seal::{seal, EncryptionKeyPair, SealedBox, SymmetricKey};

use crate::service::MemoryService;

/// An account with derived credentials and its own in-memory service.
pub struct TestAccount {
    pub credentials: Credentials,
    pub service: Arc<MemoryService>,
}

impl TestAccount {
    /// Derive credentials from a seed phrase.
    pub fn new(seed_phrase: &str) -> Self {
        Self::from_credentials(Credentials::derive(seed_phrase))
    }

    /// Deterministic credentials from a raw seed. Skips the KDF.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_credentials(Credentials::from_seed(&seed))
    }

    fn from_credentials(credentials: Credentials) -> Self {
        let service = Arc::new(MemoryService::new(credentials.signing_public_key()));
        Self { credentials, service }
    }

    /// The account's X25519 keypair.
    pub fn encryption_keypair(&self) -> EncryptionKeyPair {
        EncryptionKeyPair::from_credentials(&self.credentials)
    }

    /// Seal a diary key to this account.
    pub fn seal_key(&self, key: &SymmetricKey) -> SealedBox {
        seal(key.as_bytes(), &self.encryption_keypair().public).expect("sealing a 32-byte key")
    }

    /// A client for this account with default configuration.
    pub fn client(&self) -> DiaryClient<Arc<MemoryService>> {
        self.client_with(ClientConfig::default())
    }

    /// A client for this account.
    pub fn client_with(&self, config: ClientConfig) -> DiaryClient<Arc<MemoryService>> {
        DiaryClient::new(Arc::clone(&self.service), &self.credentials, config)
    }
}
