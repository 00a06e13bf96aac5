//! In-memory diary service.
//!
//! Implements the client transport in-process. It stores exactly what a
//! real service would see: sealed diary keys and ciphertext envelopes. Every
//! mutating request must carry a valid `X-Signature` from the account's
//! signing key.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use quill::{
    ApiRequest, ClientError, CreatedDiary, DeleteRecord, EncryptedRecord, Method, NewDiary, RecordKind, Transport,
    SIGNATURE_HEADER,
};
use quill_core::{encoding, DiaryId, Ed25519PublicKey, Ed25519Signature, KeyId};
use quill_keys::{KeyStatus, SealedDiaryKey};
use quill_seal::{seal, SymmetricKey, X25519PublicKey};

type ServiceResult = quill::Result<Value>;

#[derive(Debug, Clone)]
struct StoredDiary {
    keys: Vec<SealedDiaryKey>,
    record: EncryptedRecord,
    collections: HashMap<RecordKind, BTreeMap<String, EncryptedRecord>>,
}

#[derive(Debug, Default)]
struct State {
    diaries: BTreeMap<DiaryId, StoredDiary>,
    next_id: u64,
    requests: Vec<ApiRequest>,
    injected_failure: Option<(u16, String, String)>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// An in-process diary service for one account.
#[derive(Debug)]
pub struct MemoryService {
    account: Ed25519PublicKey,
    state: Mutex<State>,
}

impl MemoryService {
    /// A service that accepts writes signed by `account`.
    pub fn new(account: Ed25519PublicKey) -> Self {
        Self {
            account,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every request served so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state().requests.clone()
    }

    /// Number of key list fetches served for a diary.
    pub fn key_fetches(&self, diary_id: &DiaryId) -> usize {
        let path = format!("/diaries/{diary_id}/keys");
        self.state()
            .requests
            .iter()
            .filter(|r| r.method == Method::Get && r.path == path)
            .count()
    }

    /// Answer the next request with an error instead of serving it.
    pub fn fail_next(&self, status: u16, code: &str, reason: &str) {
        self.state().injected_failure = Some((status, code.to_string(), reason.to_string()));
    }

    /// Sealed keys stored for a diary.
    pub fn keys(&self, diary_id: &DiaryId) -> Vec<SealedDiaryKey> {
        self.state()
            .diaries
            .get(diary_id)
            .map(|d| d.keys.clone())
            .unwrap_or_default()
    }

    /// Add a sealed key to a diary as-is.
    pub fn add_key(&self, diary_id: &DiaryId, key: SealedDiaryKey) -> bool {
        match self.state().diaries.get_mut(diary_id) {
            Some(diary) => {
                diary.keys.push(key);
                true
            }
            None => false,
        }
    }

    /// Change the status of one stored key.
    pub fn set_key_status(&self, diary_id: &DiaryId, key_id: &KeyId, status: KeyStatus) -> bool {
        let mut state = self.state();
        match state
            .diaries
            .get_mut(diary_id)
            .and_then(|d| d.keys.iter_mut().find(|k| &k.id == key_id))
        {
            Some(key) => {
                key.status = status;
                true
            }
            None => false,
        }
    }

    /// Rotate a diary's key: the current active key becomes `rotating` and a
    /// fresh key sealed to `recipient` becomes active.
    pub fn rotate_key(&self, diary_id: &DiaryId, recipient: &X25519PublicKey) -> Option<(KeyId, SymmetricKey)> {
        let key = SymmetricKey::generate();
        let sealed_value = seal(key.as_bytes(), recipient).ok()?;

        let mut state = self.state();
        let key_id = KeyId::new(state.next_id("key"));
        let diary = state.diaries.get_mut(diary_id)?;
        for existing in diary.keys.iter_mut().filter(|k| k.status == KeyStatus::Active) {
            existing.status = KeyStatus::Rotating;
        }
        diary.keys.push(SealedDiaryKey {
            id: key_id.clone(),
            status: KeyStatus::Active,
            sealed_value,
        });
        Some((key_id, key))
    }

    /// The stored ciphertext of a diary's own details.
    pub fn stored_diary(&self, diary_id: &DiaryId) -> Option<EncryptedRecord> {
        self.state().diaries.get(diary_id).map(|d| d.record.clone())
    }

    /// The stored ciphertext of a record.
    pub fn stored_record(&self, diary_id: &DiaryId, kind: RecordKind, record_id: &str) -> Option<EncryptedRecord> {
        self.state()
            .diaries
            .get(diary_id)?
            .collections
            .get(&kind)?
            .get(record_id)
            .cloned()
    }

    /// Overwrite a stored record, bypassing signature checks.
    pub fn replace_record(&self, diary_id: &DiaryId, kind: RecordKind, record: EncryptedRecord) -> bool {
        let Some(id) = record.id.clone() else {
            return false;
        };
        match self.state().diaries.get_mut(diary_id) {
            Some(diary) => {
                diary.collections.entry(kind).or_default().insert(id, record);
                true
            }
            None => false,
        }
    }

    fn verify_signature(&self, request: &ApiRequest) -> Result<Vec<u8>, ClientError> {
        let body = request
            .body
            .clone()
            .ok_or_else(|| api_error(400, "missing_body", "request body required"))?;
        let header = request
            .header(SIGNATURE_HEADER)
            .ok_or_else(|| api_error(401, "missing_signature", "X-Signature header required"))?;
        let signature = encoding::decode_array::<64>(header)
            .map(Ed25519Signature::from_bytes)
            .map_err(|_| api_error(401, "invalid_signature", "malformed signature"))?;

        if !quill_core::verify(&body, &signature, &self.account) {
            return Err(api_error(401, "invalid_signature", "signature does not match body"));
        }
        Ok(body)
    }

    fn handle(&self, request: &ApiRequest) -> ServiceResult {
        let segments = request
            .path
            .trim_matches('/')
            .split('/')
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()))
            .collect::<Result<Vec<String>, _>>()
            .map_err(|_| api_error(400, "bad_request", "path is not valid UTF-8"))?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["diaries"]) => self.create_diary(request),
            (Method::Get, ["diaries", diary]) => self.get_diary(&DiaryId::new(*diary)),
            (Method::Put, ["diaries", diary]) => self.put_diary(request, &DiaryId::new(*diary)),
            (Method::Get, ["diaries", diary, "keys"]) => self.list_keys(&DiaryId::new(*diary)),
            (method, ["diaries", diary, collection, rest @ ..]) => {
                let kind = RecordKind::from_collection(collection)
                    .ok_or_else(|| api_error(404, "not_found", "unknown collection"))?;
                let diary = DiaryId::new(*diary);
                match (method, rest) {
                    (Method::Get, []) => self.list_records(&diary, kind),
                    (Method::Post, []) => self.create_record(request, &diary, kind),
                    (Method::Get, [id]) => self.get_record(&diary, kind, id),
                    (Method::Put, [id]) => self.put_record(request, &diary, kind, id),
                    (Method::Delete, [id]) => self.delete_record(request, &diary, kind, id),
                    _ => Err(api_error(405, "method_not_allowed", "unsupported route")),
                }
            }
            _ => Err(api_error(404, "not_found", "unknown route")),
        }
    }

    fn create_diary(&self, request: &ApiRequest) -> ServiceResult {
        let body = self.verify_signature(request)?;
        let new_diary: NewDiary = parse(&body)?;

        let mut state = self.state();
        let id = DiaryId::new(state.next_id("diary"));
        let key_id = KeyId::new(state.next_id("key"));

        state.diaries.insert(
            id.clone(),
            StoredDiary {
                keys: vec![SealedDiaryKey {
                    id: key_id.clone(),
                    status: KeyStatus::Active,
                    sealed_value: new_diary.key,
                }],
                record: EncryptedRecord {
                    id: Some(id.to_string()),
                    key_id: key_id.clone(),
                    encryption: new_diary.encryption,
                    details: new_diary.details,
                    preview: None,
                },
                collections: HashMap::new(),
            },
        );

        Ok(serde_json::to_value(CreatedDiary { id, key_id })?)
    }

    fn get_diary(&self, diary_id: &DiaryId) -> ServiceResult {
        let state = self.state();
        let diary = state.diaries.get(diary_id).ok_or_else(diary_not_found)?;
        Ok(serde_json::to_value(&diary.record)?)
    }

    fn put_diary(&self, request: &ApiRequest, diary_id: &DiaryId) -> ServiceResult {
        let body = self.verify_signature(request)?;
        let mut record: EncryptedRecord = parse(&body)?;

        let mut state = self.state();
        let diary = state.diaries.get_mut(diary_id).ok_or_else(diary_not_found)?;
        check_key(diary, &record.key_id)?;
        record.id = Some(diary_id.to_string());
        diary.record = record;
        Ok(Value::Null)
    }

    fn list_keys(&self, diary_id: &DiaryId) -> ServiceResult {
        let state = self.state();
        let diary = state.diaries.get(diary_id).ok_or_else(diary_not_found)?;
        Ok(serde_json::to_value(&diary.keys)?)
    }

    fn list_records(&self, diary_id: &DiaryId, kind: RecordKind) -> ServiceResult {
        let state = self.state();
        let diary = state.diaries.get(diary_id).ok_or_else(diary_not_found)?;
        let records: Vec<&EncryptedRecord> = diary
            .collections
            .get(&kind)
            .map(|c| c.values().collect())
            .unwrap_or_default();
        Ok(serde_json::to_value(records)?)
    }

    fn create_record(&self, request: &ApiRequest, diary_id: &DiaryId, kind: RecordKind) -> ServiceResult {
        let body = self.verify_signature(request)?;
        let mut record: EncryptedRecord = parse(&body)?;

        let mut state = self.state();
        let id = state.next_id(kind.collection());
        let diary = state.diaries.get_mut(diary_id).ok_or_else(diary_not_found)?;
        check_key(diary, &record.key_id)?;
        record.id = Some(id.clone());
        diary.collections.entry(kind).or_default().insert(id.clone(), record);
        Ok(json!({ "id": id }))
    }

    fn get_record(&self, diary_id: &DiaryId, kind: RecordKind, record_id: &str) -> ServiceResult {
        let state = self.state();
        let record = state
            .diaries
            .get(diary_id)
            .ok_or_else(diary_not_found)?
            .collections
            .get(&kind)
            .and_then(|c| c.get(record_id))
            .ok_or_else(|| api_error(404, "not_found", "no such record"))?;
        Ok(serde_json::to_value(record)?)
    }

    fn delete_record(&self, request: &ApiRequest, diary_id: &DiaryId, kind: RecordKind, record_id: &str) -> ServiceResult {
        let body = self.verify_signature(request)?;
        let target: DeleteRecord = parse(&body)?;
        if target.id.as_str() != record_id {
            return Err(api_error(400, "bad_request", "signed body names another record"));
        }

        let mut state = self.state();
        state
            .diaries
            .get_mut(diary_id)
            .ok_or_else(diary_not_found)?
            .collections
            .get_mut(&kind)
            .and_then(|c| c.remove(record_id))
            .ok_or_else(|| api_error(404, "not_found", "no such record"))?;
        Ok(Value::Null)
    }

    fn put_record(&self, request: &ApiRequest, diary_id: &DiaryId, kind: RecordKind, record_id: &str) -> ServiceResult {
        let body = self.verify_signature(request)?;
        let mut record: EncryptedRecord = parse(&body)?;

        let mut state = self.state();
        let diary = state.diaries.get_mut(diary_id).ok_or_else(diary_not_found)?;
        check_key(diary, &record.key_id)?;
        let slot = diary
            .collections
            .get_mut(&kind)
            .and_then(|c| c.get_mut(record_id))
            .ok_or_else(|| api_error(404, "not_found", "no such record"))?;
        record.id = Some(record_id.to_string());
        *slot = record;
        Ok(Value::Null)
    }
}

#[async_trait]
impl Transport for MemoryService {
    async fn request(&self, request: ApiRequest) -> ServiceResult {
        let injected = {
            let mut state = self.state();
            state.requests.push(request.clone());
            state.injected_failure.take()
        };
        if let Some((status, code, reason)) = injected {
            return Err(api_error(status, &code, &reason));
        }
        self.handle(&request)
    }
}

fn api_error(status: u16, code: &str, reason: &str) -> ClientError {
    ClientError::Api {
        status,
        code: Some(code.to_string()),
        reason: Some(reason.to_string()),
    }
}

fn diary_not_found() -> ClientError {
    api_error(404, "not_found", "no such diary")
}

fn check_key(diary: &StoredDiary, key_id: &KeyId) -> Result<(), ClientError> {
    if diary.keys.iter().any(|k| &k.id == key_id) {
        Ok(())
    } else {
        Err(api_error(400, "unknown_key", "record names a key this diary does not have"))
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| api_error(400, "bad_request", &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill::RequestSigner;
    use quill_core::Credentials;

    fn service_and_signer() -> (MemoryService, RequestSigner) {
        let credentials = Credentials::from_seed(&[7u8; 32]);
        let signer = RequestSigner::from_credentials(&credentials);
        (MemoryService::new(signer.public_key()), signer)
    }

    #[tokio::test]
    async fn test_unsigned_write_rejected() {
        let (service, _) = service_and_signer();
        let request = ApiRequest::new(Method::Post, "/diaries").with_body(b"{}".to_vec());

        let err = service.request(request).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_signature_from_other_account_rejected() {
        let (service, _) = service_and_signer();
        let other = RequestSigner::from_credentials(&Credentials::from_seed(&[8u8; 32]));
        let request = other
            .sign_json(&json!({}))
            .unwrap()
            .into_request(Method::Post, "/diaries");

        let err = service.request(request).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, ref code, .. } if code.as_deref() == Some("invalid_signature")));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (service, _) = service_and_signer();
        let err = service.request(ApiRequest::get("/nope")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        let err = service.request(ApiRequest::get("/diaries/d/keys2")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_injected_failure_served_once() {
        let (service, _) = service_and_signer();
        service.fail_next(503, "unavailable", "maintenance");

        let err = service.request(ApiRequest::get("/diaries/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(503));

        let err = service.request(ApiRequest::get("/diaries/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(service.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_encoded_segments_are_decoded() {
        let (service, _) = service_and_signer();
        let err = service.request(ApiRequest::get("/diaries/d1%2Fkeys")).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 404, ref reason, .. } if reason.as_deref() == Some("no such diary")));
    }

    #[tokio::test]
    async fn test_delete_signature_bound_to_record() {
        let (service, signer) = service_and_signer();
        let request = signer
            .sign_json(&json!({ "id": "entries-9" }))
            .unwrap()
            .into_request(Method::Delete, "/diaries/diary-1/entries/entries-2");

        let err = service.request(request).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }
}
