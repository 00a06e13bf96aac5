//! Key source abstraction.
//!
//! A key source returns the sealed diary keys the service holds for a diary.
//! The facade crate implements it over HTTP; [`MemoryKeySource`] is for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quill_core::{DiaryId, KeyId};
use quill_seal::SealedBox;

use crate::error::Result;

/// Lifecycle status of a diary key.
///
/// The client only distinguishes `active` from everything else; statuses it
/// does not know are kept as [`KeyStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Active,
    Rotating,
    #[serde(other)]
    Other,
}

/// A diary key as the service stores it: sealed to the account.
///
/// Wire shape: `{"id": "...", "status": "active", "value": "<base64>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedDiaryKey {
    pub id: KeyId,
    pub status: KeyStatus,
    #[serde(rename = "value")]
    pub sealed_value: SealedBox,
}

/// Source of sealed diary keys.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetch every key the service holds for `diary_id`.
    async fn fetch_keys(&self, diary_id: &DiaryId) -> Result<Vec<SealedDiaryKey>>;
}

#[async_trait]
impl<S: KeySource + ?Sized> KeySource for Arc<S> {
    async fn fetch_keys(&self, diary_id: &DiaryId) -> Result<Vec<SealedDiaryKey>> {
        (**self).fetch_keys(diary_id).await
    }
}

/// In-memory key source.
///
/// Counts fetches so tests can observe caching.
#[derive(Default)]
pub struct MemoryKeySource {
    keys: RwLock<HashMap<DiaryId, Vec<SealedDiaryKey>>>,
    fetches: AtomicUsize,
}

impl MemoryKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sealed key to a diary.
    pub fn insert(&self, diary_id: DiaryId, key: SealedDiaryKey) {
        self.keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(diary_id)
            .or_default()
            .push(key);
    }

    /// Change the status of one key. Returns false if the key is unknown.
    pub fn set_status(&self, diary_id: &DiaryId, key_id: &KeyId, status: KeyStatus) -> bool {
        let mut keys = self.keys.write().unwrap_or_else(|e| e.into_inner());
        match keys
            .get_mut(diary_id)
            .and_then(|keys| keys.iter_mut().find(|k| &k.id == key_id))
        {
            Some(key) => {
                key.status = status;
                true
            }
            None => false,
        }
    }

    /// Number of `fetch_keys` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for MemoryKeySource {
    async fn fetch_keys(&self, diary_id: &DiaryId) -> Result<Vec<SealedDiaryKey>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let keys = self.keys.read().unwrap_or_else(|e| e.into_inner());
        Ok(keys.get(diary_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(KeyStatus::Active).unwrap(), "active");
        assert_eq!(serde_json::to_value(KeyStatus::Rotating).unwrap(), "rotating");

        let unknown: KeyStatus = serde_json::from_value(serde_json::json!("retired")).unwrap();
        assert_eq!(unknown, KeyStatus::Other);
    }

    #[test]
    fn test_sealed_key_wire_shape() {
        let json = serde_json::json!({
            "id": "k1",
            "status": "active",
            "value": "AAEC",
        });
        let key: SealedDiaryKey = serde_json::from_value(json).unwrap();

        assert_eq!(key.id, KeyId::new("k1"));
        assert_eq!(key.status, KeyStatus::Active);
        assert_eq!(key.sealed_value.as_bytes(), &[0, 1, 2]);
    }

    #[tokio::test]
    async fn test_memory_source_counts_fetches() {
        let source = MemoryKeySource::new();
        let diary = DiaryId::new("d");

        assert!(source.fetch_keys(&diary).await.unwrap().is_empty());
        assert!(source.fetch_keys(&diary).await.unwrap().is_empty());
        assert_eq!(source.fetch_count(), 2);
    }
}
