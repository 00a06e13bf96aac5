//! Error types for the client.

use quill_keys::KeyError;
use quill_seal::SealError;
use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-2xx status.
    #[error("api error {status}: {}", .reason.as_deref().unwrap_or("no reason given"))]
    Api {
        status: u16,
        code: Option<String>,
        reason: Option<String>,
    },

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Diary key resolution failed.
    #[error("key error: {0}")]
    Keys(KeyError),

    /// Encryption or decryption failed.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// Request or response JSON error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The service answered 2xx with a body we cannot use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// HTTP status, for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<KeyError> for ClientError {
    /// API errors raised while fetching keys surface unchanged.
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::Source(inner) => match inner.downcast::<ClientError>() {
                Ok(client_error) => *client_error,
                Err(other) => ClientError::Keys(KeyError::Source(other)),
            },
            other => ClientError::Keys(other),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
