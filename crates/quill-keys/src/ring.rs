//! The per-diary key ring.
//!
//! Opens sealed diary keys with the account's encryption keypair and caches
//! the plaintext keys per diary. Cache access is serialized per diary, so
//! concurrent callers for the same diary share one fetch while different
//! diaries proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use quill_core::{DiaryId, KeyId};
use quill_seal::{EncryptionKeyPair, SymmetricKey};

use crate::error::{KeyError, Result};
use crate::source::{KeySource, KeyStatus, SealedDiaryKey};

/// Configuration for the key ring.
#[derive(Debug, Clone)]
pub struct KeyRingConfig {
    /// How long opened keys stay cached. `None` disables caching.
    pub cache_ttl: Option<Duration>,
}

impl Default for KeyRingConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Some(Duration::from_secs(300)),
        }
    }
}

/// An opened diary key.
#[derive(Debug, Clone)]
pub struct DiaryKey {
    pub id: KeyId,
    pub key: SymmetricKey,
    pub status: KeyStatus,
}

impl DiaryKey {
    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }
}

struct CachedKeys {
    keys: Vec<DiaryKey>,
    fetched_at: Instant,
}

type Slot = Arc<Mutex<Option<CachedKeys>>>;

/// Resolves and caches diary keys for one account.
pub struct KeyRing<S: KeySource> {
    source: S,
    account: EncryptionKeyPair,
    config: KeyRingConfig,
    slots: Mutex<HashMap<DiaryId, Slot>>,
}

impl<S: KeySource> KeyRing<S> {
    /// Create a key ring that opens keys with `account`.
    pub fn new(source: S, account: EncryptionKeyPair, config: KeyRingConfig) -> Self {
        Self {
            source,
            account,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get the key source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// All keys for a diary, opened.
    ///
    /// Any key that fails to open aborts the call; a diary key that does not
    /// authenticate under the account keypair is never skipped silently.
    pub async fn list_keys(&self, diary_id: &DiaryId) -> Result<Vec<DiaryKey>> {
        let slot = self.slot(diary_id).await;
        let mut cached = slot.lock().await;

        if let Some(entry) = cached.as_ref() {
            if self.is_fresh(entry) {
                debug!(diary = %diary_id, "diary keys served from cache");
                return Ok(entry.keys.clone());
            }
        }

        let keys = self.fetch(diary_id).await?;
        *cached = self.config.cache_ttl.map(|_| CachedKeys {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// The key new writes to this diary must use.
    pub async fn active_key(&self, diary_id: &DiaryId) -> Result<DiaryKey> {
        self.list_keys(diary_id)
            .await?
            .into_iter()
            .find(DiaryKey::is_active)
            .ok_or_else(|| KeyError::NoActiveKey(diary_id.clone()))
    }

    /// A specific key, by id.
    ///
    /// Records name the key that wrapped them. If that key is missing from a
    /// cached set it may have been issued since, so the cache is refreshed
    /// once before giving up.
    pub async fn key_by_id(&self, diary_id: &DiaryId, key_id: &KeyId) -> Result<DiaryKey> {
        let find = |keys: Vec<DiaryKey>| keys.into_iter().find(|k| &k.id == key_id);

        if let Some(key) = find(self.list_keys(diary_id).await?) {
            return Ok(key);
        }

        self.invalidate(diary_id).await;
        find(self.list_keys(diary_id).await?).ok_or_else(|| KeyError::UnknownKey {
            diary_id: diary_id.clone(),
            key_id: key_id.clone(),
        })
    }

    /// Seed the cache with a key created locally, e.g. at diary creation.
    ///
    /// A key with the same id replaces the cached one. No-op when caching
    /// is disabled.
    pub async fn remember(&self, diary_id: &DiaryId, key: DiaryKey) {
        if self.config.cache_ttl.is_none() {
            return;
        }

        let slot = self.slot(diary_id).await;
        let mut cached = slot.lock().await;
        let entry = cached.get_or_insert_with(|| CachedKeys {
            keys: Vec::new(),
            fetched_at: Instant::now(),
        });
        entry.keys.retain(|k| k.id != key.id);
        entry.keys.push(key);
    }

    /// Drop cached keys for a diary.
    pub async fn invalidate(&self, diary_id: &DiaryId) {
        let removed = self.slots.lock().await.remove(diary_id);
        if let Some(slot) = removed {
            *slot.lock().await = None;
        }
    }

    /// Get or create the slot for a diary.
    ///
    /// Creating a slot first prunes slots nobody is using whose keys are
    /// absent or expired.
    async fn slot(&self, diary_id: &DiaryId) -> Slot {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.get(diary_id) {
            return Arc::clone(slot);
        }

        slots.retain(|_, slot| Arc::strong_count(slot) > 1 || self.holds_fresh_keys(slot));
        Arc::clone(slots.entry(diary_id.clone()).or_default())
    }

    fn holds_fresh_keys(&self, slot: &Slot) -> bool {
        match slot.try_lock() {
            Ok(cached) => cached.as_ref().is_some_and(|entry| self.is_fresh(entry)),
            Err(_) => true,
        }
    }

    fn is_fresh(&self, entry: &CachedKeys) -> bool {
        self.config
            .cache_ttl
            .is_some_and(|ttl| entry.fetched_at.elapsed() < ttl)
    }

    async fn fetch(&self, diary_id: &DiaryId) -> Result<Vec<DiaryKey>> {
        let sealed = self.source.fetch_keys(diary_id).await?;
        debug!(diary = %diary_id, count = sealed.len(), "fetched sealed diary keys");

        sealed.iter().map(|s| self.open(diary_id, s)).collect()
    }

    fn open(&self, diary_id: &DiaryId, sealed: &SealedDiaryKey) -> Result<DiaryKey> {
        let opened = sealed
            .sealed_value
            .open(&self.account.secret, &self.account.public)
            .and_then(|bytes| SymmetricKey::from_slice(&Zeroizing::new(bytes)));

        match opened {
            Ok(key) => Ok(DiaryKey {
                id: sealed.id.clone(),
                key,
                status: sealed.status,
            }),
            Err(e) => {
                warn!(diary = %diary_id, key = %sealed.id, error = %e, "diary key failed to open");
                Err(e.into())
            }
        }
    }
}
