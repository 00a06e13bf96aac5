//! HTTP transport and client tests against a mock server.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quill::keys::{KeyStatus, SealedDiaryKey};
use quill::seal::{seal, wrap_record, EncryptionKeyPair, SymmetricKey};
use quill::{
    ApiRequest, ClientConfig, ClientError, Credentials, DiaryClient, DiaryId, EncryptedRecord, HttpTransport,
    KeyId, Method, RecordKind, RecordSealer, Transport, SIGNATURE_HEADER,
};
use quill_core::{encoding, Ed25519Signature};

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::with_base_url(server.uri()).api_token("test-token")
}

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&config(server)).unwrap()
}

#[tokio::test]
async fn get_sends_bearer_and_parses_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/diaries/d1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let value = transport(&server).request(ApiRequest::get("/diaries/d1")).await.unwrap();
    assert_eq!(value, json!({ "ok": true }));
}

#[tokio::test]
async fn user_agent_is_sent() {
    let server = MockServer::start().await;
    let mut config = config(&server);
    config.user_agent = "quill-tests/1".into();
    Mock::given(method("GET"))
        .and(header("user-agent", "quill-tests/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config).unwrap();
    transport.request(ApiRequest::get("/x")).await.unwrap();
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let request = ApiRequest::new(Method::Put, "/diaries/d1").with_body(b"{}".to_vec());
    let value = transport(&server).request(request).await.unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn error_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "code": "forbidden", "reason": "not your diary" })),
        )
        .mount(&server)
        .await;

    let err = transport(&server).request(ApiRequest::get("/diaries/d1")).await.unwrap_err();
    match err {
        ClientError::Api { status, code, reason } => {
            assert_eq!(status, 403);
            assert_eq!(code.as_deref(), Some("forbidden"));
            assert_eq!(reason.as_deref(), Some("not your diary"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_without_json_body_still_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = transport(&server).request(ApiRequest::get("/")).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 502, code: None, reason: None }));
}

#[tokio::test]
async fn invalid_json_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = transport(&server).request(ApiRequest::get("/")).await.unwrap_err();
    assert!(matches!(err, ClientError::Serialization(_)));
}

#[tokio::test]
async fn client_reads_record_served_over_http() {
    let server = MockServer::start().await;
    let credentials = Credentials::from_seed(&[21u8; 32]);
    let account = EncryptionKeyPair::from_credentials(&credentials);
    let diary_key = SymmetricKey::generate();

    let keys = vec![SealedDiaryKey {
        id: KeyId::new("k1"),
        status: KeyStatus::Active,
        sealed_value: seal(diary_key.as_bytes(), &account.public).unwrap(),
    }];
    let mut record = EncryptedRecord::new(
        KeyId::new("k1"),
        wrap_record(&json!({ "title": "Day 1" }), &diary_key).unwrap(),
    );
    record.id = Some("e1".into());

    Mock::given(method("GET"))
        .and(path("/diaries/d1/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&keys))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/diaries/d1/entries/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&record))
        .expect(2)
        .mount(&server)
        .await;

    let client = DiaryClient::connect(config(&server), &credentials).unwrap();
    let diary = DiaryId::new("d1");
    for _ in 0..2 {
        let opened = client
            .get_record::<serde_json::Value>(RecordKind::Entry, &diary, &"e1".into())
            .await
            .unwrap();
        assert_eq!(opened.details["title"], "Day 1");
    }
}

#[tokio::test]
async fn client_write_carries_signature_over_sent_body() {
    let server = MockServer::start().await;
    let credentials = Credentials::from_seed(&[22u8; 32]);
    let account = EncryptionKeyPair::from_credentials(&credentials);
    let diary_key = SymmetricKey::generate();

    let keys = vec![SealedDiaryKey {
        id: KeyId::new("k1"),
        status: KeyStatus::Active,
        sealed_value: seal(diary_key.as_bytes(), &account.public).unwrap(),
    }];
    Mock::given(method("GET"))
        .and(path("/diaries/d1/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&keys))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/diaries/d1/entries"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "e9" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiaryClient::connect(config(&server), &credentials).unwrap();
    let sealer = RecordSealer::new(&json!({ "title": "secret title" })).unwrap();
    let id = client
        .create_record(RecordKind::Entry, &DiaryId::new("d1"), sealer)
        .await
        .unwrap();
    assert_eq!(id.as_str(), "e9");

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();

    let header = post.headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
    let signature = Ed25519Signature::from_bytes(encoding::decode_array::<64>(header).unwrap());
    assert!(quill_core::verify(&post.body, &signature, &credentials.signing_public_key()));

    let body = String::from_utf8(post.body.clone()).unwrap();
    assert!(!body.contains("secret title"));
    let sent: EncryptedRecord = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(sent.key_id, KeyId::new("k1"));
}

#[tokio::test]
async fn delete_is_signed_and_encoded() {
    let server = MockServer::start().await;
    let credentials = Credentials::from_seed(&[23u8; 32]);
    Mock::given(method("DELETE"))
        .and(path("/diaries/d1/entries/e%201"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = DiaryClient::connect(config(&server), &credentials).unwrap();
    client
        .delete_record(RecordKind::Entry, &DiaryId::new("d1"), &"e 1".into())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let header = requests[0].headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
    let signature = Ed25519Signature::from_bytes(encoding::decode_array::<64>(header).unwrap());
    assert!(quill_core::verify(&requests[0].body, &signature, &credentials.signing_public_key()));
    assert_eq!(requests[0].body, br#"{"id":"e 1"}"#);
}
