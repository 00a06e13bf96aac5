//! Full key hierarchy: credentials, sealed diary key, two-tier record.

use serde_json::{json, Value};

use quill_core::Credentials;
use quill_seal::{
    seal, unseal, unwrap_preview, unwrap_record, EncryptionKeyPair, RecordSealer, SealError, SymmetricKey,
};

#[test]
fn test_alpha_account_end_to_end() {
    let credentials = Credentials::derive("alpha");
    let account = EncryptionKeyPair::from_credentials(&credentials);

    // A diary key delivered to the account.
    let diary_key = SymmetricKey::generate();
    let sealed = seal(diary_key.as_bytes(), &account.public).unwrap();

    // Later, possibly on another device: rederive and open.
    let again = EncryptionKeyPair::from_credentials(&Credentials::derive("alpha"));
    let opened = unseal(sealed.as_bytes(), &again.secret, &again.public).unwrap();
    let diary_key_again = SymmetricKey::from_slice(&opened).unwrap();
    assert_eq!(diary_key_again, diary_key);

    let fields = json!({ "title": "t", "description": "d" });
    let wrapped = RecordSealer::new(&fields)
        .unwrap()
        .preview(&json!({ "title": "t" }))
        .unwrap()
        .seal(&diary_key)
        .unwrap();

    let recovered: Value = unwrap_record(&wrapped, &diary_key_again).unwrap();
    assert_eq!(recovered, fields);
    let preview: Option<Value> = unwrap_preview(&wrapped, &diary_key_again).unwrap();
    assert_eq!(preview, Some(json!({ "title": "t" })));
}

#[test]
fn test_other_account_cannot_open_diary_key() {
    let owner = EncryptionKeyPair::from_credentials(&Credentials::from_seed(&[1u8; 32]));
    let other = EncryptionKeyPair::from_credentials(&Credentials::from_seed(&[2u8; 32]));

    let sealed = seal(SymmetricKey::generate().as_bytes(), &owner.public).unwrap();
    let result = sealed.open(&other.secret, &other.public);

    assert!(matches!(result, Err(SealError::DecryptionFailed)));
}

#[test]
fn test_wrapped_record_json_is_ciphertext_only() {
    let diary_key = SymmetricKey::generate();
    let wrapped = RecordSealer::new(&json!({ "title": "my secret" }))
        .unwrap()
        .seal(&diary_key)
        .unwrap();

    let json = serde_json::to_string(&wrapped).unwrap();
    assert!(!json.contains("my secret"));
    assert!(!json.contains("encrypted_preview"));

    let back: quill_seal::WrappedRecord = serde_json::from_str(&json).unwrap();
    let recovered: Value = unwrap_record(&back, &diary_key).unwrap();
    assert_eq!(recovered["title"], "my secret");
}
