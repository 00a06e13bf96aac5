//! Two-tier record codec.
//!
//! Every record (diary details, topic, entry, template) is written as:
//!
//! - `encrypted_entity_key`: a fresh entity key encrypted under the diary key
//! - `encrypted_fields`: the record's canonical JSON encrypted under the
//!   entity key
//! - optionally `encrypted_preview`: a reduced copy of the fields, encrypted
//!   under the same entity key
//!
//! The codec does not care what the fields are; any `Serialize` value goes
//! in and any `DeserializeOwned` value comes out.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::SymmetricKey;
use crate::envelope::Envelope;
use crate::error::Result;

/// The ciphertext form of one record version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedRecord {
    /// Entity key, encrypted under the diary key.
    pub encrypted_entity_key: Envelope,

    /// Record fields, encrypted under the entity key.
    pub encrypted_fields: Envelope,

    /// Preview fields, encrypted under the entity key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_preview: Option<Envelope>,
}

/// Builder for a record write with an optional preview.
pub struct RecordSealer {
    fields: serde_json::Value,
    preview: Option<serde_json::Value>,
}

impl RecordSealer {
    /// Start sealing a record from its plaintext fields.
    pub fn new<T: Serialize + ?Sized>(fields: &T) -> Result<Self> {
        Ok(Self {
            fields: serde_json::to_value(fields)?,
            preview: None,
        })
    }

    /// Attach a preview payload.
    pub fn preview<T: Serialize + ?Sized>(mut self, preview: &T) -> Result<Self> {
        self.preview = Some(serde_json::to_value(preview)?);
        Ok(self)
    }

    /// Encrypt under a fresh entity key and wrap that key with `diary_key`.
    ///
    /// The entity key is dropped (and zeroized) when this returns.
    pub fn seal(self, diary_key: &SymmetricKey) -> Result<WrappedRecord> {
        let entity_key = SymmetricKey::generate();

        let encrypted_fields = Envelope::encrypt(&canonical_json(&self.fields)?, &entity_key)?;
        let encrypted_preview = self
            .preview
            .as_ref()
            .map(|preview| Envelope::encrypt(&canonical_json(preview)?, &entity_key))
            .transpose()?;
        let encrypted_entity_key = Envelope::encrypt(entity_key.as_bytes(), diary_key)?;

        Ok(WrappedRecord {
            encrypted_entity_key,
            encrypted_fields,
            encrypted_preview,
        })
    }
}

/// Wrap a record's fields under a fresh entity key.
pub fn wrap_record<T: Serialize + ?Sized>(fields: &T, diary_key: &SymmetricKey) -> Result<WrappedRecord> {
    RecordSealer::new(fields)?.seal(diary_key)
}

/// Recover a record's fields.
///
/// Fails with [`SealError::Decryption`](crate::SealError::Decryption) if
/// either the entity key or the fields do not authenticate. No partial
/// result is ever returned.
pub fn unwrap_record<T: DeserializeOwned>(wrapped: &WrappedRecord, diary_key: &SymmetricKey) -> Result<T> {
    let entity_key = open_entity_key(&wrapped.encrypted_entity_key, diary_key)?;
    let plaintext = wrapped.encrypted_fields.decrypt(&entity_key)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Recover a record's preview, if it has one.
pub fn unwrap_preview<T: DeserializeOwned>(
    wrapped: &WrappedRecord,
    diary_key: &SymmetricKey,
) -> Result<Option<T>> {
    let Some(preview) = &wrapped.encrypted_preview else {
        return Ok(None);
    };
    let entity_key = open_entity_key(&wrapped.encrypted_entity_key, diary_key)?;
    let plaintext = preview.decrypt(&entity_key)?;
    Ok(Some(serde_json::from_slice(&plaintext)?))
}

fn open_entity_key(encrypted: &Envelope, diary_key: &SymmetricKey) -> Result<SymmetricKey> {
    let key_bytes = zeroize::Zeroizing::new(encrypted.decrypt(diary_key)?);
    SymmetricKey::from_slice(&key_bytes)
}

/// Stable JSON bytes: object keys sorted, no insignificant whitespace.
fn canonical_json(value: &serde_json::Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&sorted(value))?)
}

fn sorted(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, sorted(v))).collect();
            Value::Object(ordered.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SealError;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct EntryDetails {
        title: String,
        body: String,
        mood: Option<u8>,
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let diary_key = SymmetricKey::generate();
        let fields = json!({ "title": "t", "description": "d" });

        let wrapped = wrap_record(&fields, &diary_key).unwrap();
        let recovered: serde_json::Value = unwrap_record(&wrapped, &diary_key).unwrap();

        assert_eq!(recovered, fields);
    }

    #[test]
    fn test_typed_fields() {
        let diary_key = SymmetricKey::generate();
        let details = EntryDetails {
            title: "Monday".into(),
            body: "rained all day".into(),
            mood: Some(3),
        };

        let wrapped = wrap_record(&details, &diary_key).unwrap();
        let recovered: EntryDetails = unwrap_record(&wrapped, &diary_key).unwrap();

        assert_eq!(recovered, details);
    }

    #[test]
    fn test_wrong_diary_key_fails() {
        let wrapped = wrap_record(&json!({ "title": "t" }), &SymmetricKey::generate()).unwrap();

        let result: Result<serde_json::Value> = unwrap_record(&wrapped, &SymmetricKey::generate());
        assert!(matches!(result, Err(SealError::Decryption)));
    }

    #[test]
    fn test_fresh_entity_key_per_write() {
        let diary_key = SymmetricKey::generate();
        let fields = json!({ "title": "same" });

        let a = wrap_record(&fields, &diary_key).unwrap();
        let b = wrap_record(&fields, &diary_key).unwrap();

        let key_a = a.encrypted_entity_key.decrypt(&diary_key).unwrap();
        let key_b = b.encrypted_entity_key.decrypt(&diary_key).unwrap();
        assert_ne!(key_a, key_b);
        assert_ne!(a.encrypted_fields, b.encrypted_fields);
        assert_ne!(a.encrypted_entity_key.nonce, a.encrypted_fields.nonce);
    }

    #[test]
    fn test_mismatched_entity_key_fails() {
        // Fields from one record paired with another record's entity key.
        let diary_key = SymmetricKey::generate();
        let a = wrap_record(&json!({ "n": 1 }), &diary_key).unwrap();
        let b = wrap_record(&json!({ "n": 2 }), &diary_key).unwrap();

        let spliced = WrappedRecord {
            encrypted_entity_key: a.encrypted_entity_key,
            encrypted_fields: b.encrypted_fields,
            encrypted_preview: None,
        };
        let result: Result<serde_json::Value> = unwrap_record(&spliced, &diary_key);
        assert!(matches!(result, Err(SealError::Decryption)));
    }

    #[test]
    fn test_canonical_key_order() {
        let diary_key = SymmetricKey::generate();
        let fields = json!({ "zeta": 1, "alpha": { "y": [{ "b": 0, "a": 1 }], "x": null } });
        let wrapped = wrap_record(&fields, &diary_key).unwrap();

        let entity_key = open_entity_key(&wrapped.encrypted_entity_key, &diary_key).unwrap();
        let plaintext = wrapped.encrypted_fields.decrypt(&entity_key).unwrap();
        assert_eq!(
            plaintext,
            br#"{"alpha":{"x":null,"y":[{"a":1,"b":0}]},"zeta":1}"#
        );
    }

    #[test]
    fn test_preview_shares_entity_key() {
        let diary_key = SymmetricKey::generate();
        let wrapped = RecordSealer::new(&json!({ "title": "t", "body": "long text" }))
            .unwrap()
            .preview(&json!({ "title": "t" }))
            .unwrap()
            .seal(&diary_key)
            .unwrap();

        let preview: Option<serde_json::Value> = unwrap_preview(&wrapped, &diary_key).unwrap();
        assert_eq!(preview, Some(json!({ "title": "t" })));

        let entity_key = open_entity_key(&wrapped.encrypted_entity_key, &diary_key).unwrap();
        let preview_envelope = wrapped.encrypted_preview.as_ref().unwrap();
        assert!(preview_envelope.decrypt(&entity_key).is_ok());
        assert!(wrapped.encrypted_fields.decrypt(&entity_key).is_ok());
        assert_ne!(preview_envelope.nonce, wrapped.encrypted_fields.nonce);
    }

    #[test]
    fn test_missing_preview_is_none() {
        let diary_key = SymmetricKey::generate();
        let wrapped = wrap_record(&json!({}), &diary_key).unwrap();

        let preview: Option<serde_json::Value> = unwrap_preview(&wrapped, &diary_key).unwrap();
        assert!(preview.is_none());
    }

    #[test]
    fn test_undecodable_fields_are_serialization_errors() {
        let diary_key = SymmetricKey::generate();
        let wrapped = wrap_record(&json!({ "title": 5 }), &diary_key).unwrap();

        let result: Result<EntryDetails> = unwrap_record(&wrapped, &diary_key);
        assert!(matches!(result, Err(SealError::Serialization(_))));
    }
}
