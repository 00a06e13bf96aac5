//! Base64 wire encoding.
//!
//! Every binary value crosses the transport boundary as a standard base64
//! string. The [`b64`] module plugs into `#[serde(with = ...)]` and the
//! [`base64_serde!`](crate::base64_serde) macro gives fixed-width newtypes
//! the same representation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{CoreError, Result};

/// Encode bytes as a standard base64 string.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Decode a standard base64 string.
pub fn decode(s: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| CoreError::Decoding(e.to_string()))
}

/// Decode a base64 string that must hold exactly `N` bytes.
pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = decode(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CoreError::Decoding(format!("expected {} bytes, got {}", N, len)))
}

/// Serde adapter for byte containers encoded as base64 strings.
///
/// Works for `Vec<u8>` and fixed-size arrays; arrays reject strings that
/// decode to the wrong length.
pub mod b64 {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: AsRef<[u8]>,
    {
        serializer.serialize_str(&super::encode(value))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<Vec<u8>>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = super::decode(&s).map_err(D::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes).map_err(|_| D::Error::custom(format!("unexpected length {len}")))
    }
}

/// Implement base64 `Serialize`/`Deserialize` for a tuple newtype over a
/// byte container.
#[macro_export]
macro_rules! base64_serde {
    ($ty:ty) => {
        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                $crate::encoding::b64::serialize(&self.0, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                $crate::encoding::b64::deserialize(deserializer).map(Self)
            }
        }
    };
}
