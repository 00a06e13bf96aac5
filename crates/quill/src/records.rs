//! Wire shapes for encrypted records.
//!
//! Only ciphertext crosses the wire. Each record names the diary key that
//! wrapped its entity key so readers can pick the right key after rotation.

use serde::{Deserialize, Serialize};

use quill_core::{DiaryId, KeyId, RecordId};
use quill_seal::{Envelope, SealedBox, WrappedRecord};

/// Kinds of records stored inside a diary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Topic,
    Entry,
    Template,
}

impl RecordKind {
    /// URL path segment for the collection.
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::Topic => "topics",
            RecordKind::Entry => "entries",
            RecordKind::Template => "templates",
        }
    }

    /// Parse a collection path segment.
    pub fn from_collection(segment: &str) -> Option<Self> {
        match segment {
            "topics" => Some(RecordKind::Topic),
            "entries" => Some(RecordKind::Entry),
            "templates" => Some(RecordKind::Template),
            _ => None,
        }
    }
}

/// A record as the service stores and returns it.
///
/// `id` is absent on writes; the service assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Diary key that wrapped `encryption`.
    pub key_id: KeyId,

    /// Entity key encrypted under the diary key.
    pub encryption: Envelope,

    /// Record fields encrypted under the entity key.
    pub details: Envelope,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Envelope>,
}

impl EncryptedRecord {
    pub fn new(key_id: KeyId, wrapped: WrappedRecord) -> Self {
        Self {
            id: None,
            key_id,
            encryption: wrapped.encrypted_entity_key,
            details: wrapped.encrypted_fields,
            preview: wrapped.encrypted_preview,
        }
    }

    /// The codec view of this record.
    pub fn wrapped(&self) -> WrappedRecord {
        WrappedRecord {
            encrypted_entity_key: self.encryption.clone(),
            encrypted_fields: self.details.clone(),
            encrypted_preview: self.preview.clone(),
        }
    }
}

/// Body of a diary creation request.
///
/// Carries the new diary key sealed to the creating account alongside the
/// diary's own encrypted details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDiary {
    pub key: SealedBox,
    pub encryption: Envelope,
    pub details: Envelope,
}

/// Service answer to a diary creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDiary {
    pub id: DiaryId,
    pub key_id: KeyId,
}

/// Service answer to a record creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: RecordId,
}

/// Body of a record deletion. Names the record so the signature is bound
/// to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRecord {
    pub id: RecordId,
}

/// A decrypted record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: Option<String>,
    pub key_id: KeyId,
    pub details: T,
}
