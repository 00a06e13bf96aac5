//! The diary client: signed, end-to-end encrypted diary CRUD.
//!
//! Writes wrap the record under a fresh entity key, wrap that key under the
//! diary's active key, and sign the JSON body. Reads fetch ciphertext, pick
//! the diary key the record names, and decrypt locally. Plaintext never
//! leaves this process.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use quill_core::{Credentials, DiaryId, Ed25519PublicKey, RecordId};
use quill_keys::{DiaryKey, KeyError, KeyRing, KeySource, KeyStatus, SealedDiaryKey};
use quill_seal::{seal, unwrap_preview, unwrap_record, EncryptionKeyPair, RecordSealer, SymmetricKey};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::records::{CreatedDiary, CreatedRecord, DeleteRecord, EncryptedRecord, NewDiary, Record, RecordKind};
use crate::signer::RequestSigner;
use crate::transport::{ApiRequest, HttpTransport, Method, Transport};

/// Fetches sealed diary keys from the service.
pub struct ApiKeySource<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> ApiKeySource<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> KeySource for ApiKeySource<T> {
    async fn fetch_keys(&self, diary_id: &DiaryId) -> quill_keys::Result<Vec<SealedDiaryKey>> {
        let value = self
            .transport
            .request(ApiRequest::get(keys_path(diary_id)))
            .await
            .map_err(|e| KeyError::Source(Box::new(e)))?;
        decode(value).map_err(|e| KeyError::Source(Box::new(e)))
    }
}

/// Client for one account's diaries.
pub struct DiaryClient<T: Transport> {
    transport: Arc<T>,
    keys: KeyRing<ApiKeySource<T>>,
    signer: RequestSigner,
    account: EncryptionKeyPair,
}

impl DiaryClient<HttpTransport> {
    /// Connect over HTTPS using `config`.
    pub fn connect(config: ClientConfig, credentials: &Credentials) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(transport, credentials, config))
    }
}

impl<T: Transport> DiaryClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: T, credentials: &Credentials, config: ClientConfig) -> Self {
        let transport = Arc::new(transport);
        let account = EncryptionKeyPair::from_credentials(credentials);
        let keys = KeyRing::new(
            ApiKeySource::new(Arc::clone(&transport)),
            account.clone(),
            config.key_cache,
        );

        Self {
            transport,
            keys,
            signer: RequestSigner::from_credentials(credentials),
            account,
        }
    }

    /// The account's signing public key.
    pub fn signing_public_key(&self) -> Ed25519PublicKey {
        self.signer.public_key()
    }

    /// Get the transport reference.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the key ring reference.
    pub fn keys(&self) -> &KeyRing<ApiKeySource<T>> {
        &self.keys
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Diaries
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a diary.
    ///
    /// Generates the diary key, seals it to this account, and encrypts the
    /// diary's own details under it. The new key is cached as active.
    pub async fn create_diary<D: Serialize + ?Sized>(&self, details: &D) -> Result<DiaryId> {
        let diary_key = SymmetricKey::generate();
        let sealed_key = seal(diary_key.as_bytes(), &self.account.public)?;
        let wrapped = RecordSealer::new(details)?.seal(&diary_key)?;

        let body = NewDiary {
            key: sealed_key,
            encryption: wrapped.encrypted_entity_key,
            details: wrapped.encrypted_fields,
        };
        let request = self.signer.sign_json(&body)?.into_request(Method::Post, "/diaries");
        let created: CreatedDiary = decode(self.transport.request(request).await?)?;
        debug!(diary = %created.id, key = %created.key_id, "diary created");

        self.keys
            .remember(
                &created.id,
                DiaryKey {
                    id: created.key_id,
                    key: diary_key,
                    status: KeyStatus::Active,
                },
            )
            .await;
        Ok(created.id)
    }

    /// Fetch and decrypt a diary's details.
    pub async fn get_diary<D: DeserializeOwned>(&self, diary_id: &DiaryId) -> Result<Record<D>> {
        let record: EncryptedRecord =
            decode(self.transport.request(ApiRequest::get(diary_path(diary_id))).await?)?;
        self.open(diary_id, record).await
    }

    /// Replace a diary's details, encrypted under the current active key.
    pub async fn update_diary<D: Serialize + ?Sized>(&self, diary_id: &DiaryId, details: &D) -> Result<()> {
        let record = self.seal_record(diary_id, RecordSealer::new(details)?).await?;
        let request = self
            .signer
            .sign_json(&record)?
            .into_request(Method::Put, diary_path(diary_id));
        self.transport.request(request).await?;
        debug!(diary = %diary_id, key = %record.key_id, "diary updated");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a topic, entry, or template in a diary.
    ///
    /// `sealer` carries the fields and optional preview; see [`RecordSealer`].
    pub async fn create_record(
        &self,
        kind: RecordKind,
        diary_id: &DiaryId,
        sealer: RecordSealer,
    ) -> Result<RecordId> {
        let record = self.seal_record(diary_id, sealer).await?;
        let request = self
            .signer
            .sign_json(&record)?
            .into_request(Method::Post, collection_path(diary_id, kind));
        let created: CreatedRecord = decode(self.transport.request(request).await?)?;
        debug!(diary = %diary_id, kind = kind.collection(), record = %created.id, "record created");
        Ok(created.id)
    }

    /// Replace a record, encrypted under a fresh entity key.
    pub async fn put_record(
        &self,
        kind: RecordKind,
        diary_id: &DiaryId,
        record_id: &RecordId,
        sealer: RecordSealer,
    ) -> Result<()> {
        let record = self.seal_record(diary_id, sealer).await?;
        let request = self
            .signer
            .sign_json(&record)?
            .into_request(Method::Put, record_path(diary_id, kind, record_id));
        self.transport.request(request).await?;
        debug!(diary = %diary_id, kind = kind.collection(), record = %record_id, "record updated");
        Ok(())
    }

    /// Delete a record.
    ///
    /// The signed body names the record so a signature cannot be replayed
    /// against another path.
    pub async fn delete_record(&self, kind: RecordKind, diary_id: &DiaryId, record_id: &RecordId) -> Result<()> {
        let body = DeleteRecord { id: record_id.clone() };
        let request = self
            .signer
            .sign_json(&body)?
            .into_request(Method::Delete, record_path(diary_id, kind, record_id));
        self.transport.request(request).await?;
        debug!(diary = %diary_id, kind = kind.collection(), record = %record_id, "record deleted");
        Ok(())
    }

    /// Fetch and decrypt one record.
    pub async fn get_record<D: DeserializeOwned>(
        &self,
        kind: RecordKind,
        diary_id: &DiaryId,
        record_id: &RecordId,
    ) -> Result<Record<D>> {
        let record = self.fetch_record(kind, diary_id, record_id).await?;
        self.open(diary_id, record).await
    }

    /// Fetch and decrypt only a record's preview.
    pub async fn get_preview<P: DeserializeOwned>(
        &self,
        kind: RecordKind,
        diary_id: &DiaryId,
        record_id: &RecordId,
    ) -> Result<Option<P>> {
        let record = self.fetch_record(kind, diary_id, record_id).await?;
        let key = self.keys.key_by_id(diary_id, &record.key_id).await?;
        Ok(unwrap_preview(&record.wrapped(), &key.key)?)
    }

    /// Fetch and decrypt every record of one kind.
    ///
    /// Fails as a whole if any record does not decrypt.
    pub async fn list_records<D: DeserializeOwned>(
        &self,
        kind: RecordKind,
        diary_id: &DiaryId,
    ) -> Result<Vec<Record<D>>> {
        let records: Vec<EncryptedRecord> = decode(
            self.transport
                .request(ApiRequest::get(collection_path(diary_id, kind)))
                .await?,
        )?;

        let mut opened = Vec::with_capacity(records.len());
        for record in records {
            opened.push(self.open(diary_id, record).await?);
        }
        Ok(opened)
    }

    async fn fetch_record(
        &self,
        kind: RecordKind,
        diary_id: &DiaryId,
        record_id: &RecordId,
    ) -> Result<EncryptedRecord> {
        decode(
            self.transport
                .request(ApiRequest::get(record_path(diary_id, kind, record_id)))
                .await?,
        )
    }

    async fn seal_record(&self, diary_id: &DiaryId, sealer: RecordSealer) -> Result<EncryptedRecord> {
        let active = self.keys.active_key(diary_id).await?;
        let wrapped = sealer.seal(&active.key)?;
        Ok(EncryptedRecord::new(active.id, wrapped))
    }

    async fn open<D: DeserializeOwned>(&self, diary_id: &DiaryId, record: EncryptedRecord) -> Result<Record<D>> {
        let key = self.keys.key_by_id(diary_id, &record.key_id).await?;
        let details = unwrap_record(&record.wrapped(), &key.key)?;
        Ok(Record {
            id: record.id,
            key_id: record.key_id,
            details,
        })
    }
}

fn decode<D: DeserializeOwned>(value: serde_json::Value) -> Result<D> {
    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedResponse(e.to_string()))
}

/// Percent-encode an id for use as one path segment.
///
/// Dot segments are encoded too, since URL normalization would otherwise
/// collapse them.
fn segment(id: &str) -> Cow<'_, str> {
    match id {
        "." => Cow::Borrowed("%2E"),
        ".." => Cow::Borrowed("%2E%2E"),
        _ => urlencoding::encode(id),
    }
}

fn diary_path(diary_id: &DiaryId) -> String {
    format!("/diaries/{}", segment(diary_id.as_str()))
}

fn keys_path(diary_id: &DiaryId) -> String {
    format!("{}/keys", diary_path(diary_id))
}

fn collection_path(diary_id: &DiaryId, kind: RecordKind) -> String {
    format!("{}/{}", diary_path(diary_id), kind.collection())
}

fn record_path(diary_id: &DiaryId, kind: RecordKind, record_id: &RecordId) -> String {
    format!("{}/{}", collection_path(diary_id, kind), segment(record_id.as_str()))
}
