//! Request signing.
//!
//! Every mutating request carries a detached Ed25519 signature over its exact
//! body bytes in the `X-Signature` header, base64-encoded. The service checks
//! it against the account's registered signing public key.

use serde::Serialize;

use quill_core::{Credentials, Ed25519PublicKey, Ed25519Signature, Keypair};

use crate::error::Result;
use crate::transport::{ApiRequest, Method};

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Signs request bodies with the account's signing key.
pub struct RequestSigner {
    keypair: Keypair,
}

impl RequestSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self::new(credentials.signing_keypair())
    }

    /// Public key the service verifies against.
    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Detached signature over `body`.
    pub fn sign_request(&self, body: &[u8]) -> Ed25519Signature {
        self.keypair.sign(body)
    }

    /// Serialize `body` to JSON once and sign those bytes.
    pub fn sign_json<T: Serialize + ?Sized>(&self, body: &T) -> Result<SignedRequest> {
        let body = serde_json::to_vec(body)?;
        let signature = self.sign_request(&body);
        Ok(SignedRequest { body, signature })
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("public_key", &self.public_key())
            .finish()
    }
}

/// A body and the signature over it.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub body: Vec<u8>,
    pub signature: Ed25519Signature,
}

impl SignedRequest {
    /// The `X-Signature` header value.
    pub fn header_value(&self) -> String {
        self.signature.to_base64()
    }

    /// Turn into an API request with the body and signature header attached.
    pub fn into_request(self, method: Method, path: impl Into<String>) -> ApiRequest {
        let signature = self.header_value();
        ApiRequest::new(method, path)
            .with_body(self.body)
            .with_header(SIGNATURE_HEADER, signature)
    }
}
