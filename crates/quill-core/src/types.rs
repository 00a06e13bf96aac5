//! Identifier types shared across Quill.
//!
//! Identifiers are assigned by the service and treated as opaque strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifies a diary.
    DiaryId
);

string_id!(
    /// Identifies one diary key (a diary may hold several during rotation).
    KeyId
);

string_id!(
    /// Identifies a topic, entry, or template within a diary.
    RecordId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = DiaryId::new("d-1");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("d-1"));
        assert_eq!(id.to_string(), "d-1");
    }
}
