//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Value};

use quill_core::Keypair;
use quill_seal::{EncryptionKeyPair, SymmetricKey, X25519StaticSecret};

/// Generate a random signing keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random X25519 keypair.
pub fn encryption_keypair() -> impl Strategy<Value = EncryptionKeyPair> {
    any::<[u8; 32]>().prop_map(|bytes| {
        let secret = X25519StaticSecret::from_bytes(bytes);
        let public = secret.public_key();
        EncryptionKeyPair { secret, public }
    })
}

/// Generate a random diary or entity key.
pub fn symmetric_key() -> impl Strategy<Value = SymmetricKey> {
    any::<[u8; 32]>().prop_map(SymmetricKey::from_bytes)
}

/// Generate a short seed phrase of lowercase words.
pub fn seed_phrase() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{3,8}", 1..6).prop_map(|words| words.join(" "))
}

/// Generate a JSON scalar.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        ".{0,40}".prop_map(Value::String),
    ]
}

/// Generate a record's fields: a JSON object, possibly nested.
pub fn record_fields() -> impl Strategy<Value = Value> {
    let leaf = json_scalar();
    let nested = leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,10}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    });
    prop::collection::btree_map("[a-z_]{1,12}", nested, 0..6)
        .prop_map(|m| Value::Object(m.into_iter().collect()))
}
