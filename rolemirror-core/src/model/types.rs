//! Identifier types for Spaces, users and markers

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the identifier is empty or whitespace
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }
    };
}

string_id!(
    /// Opaque, stable identifier of a Space
    SpaceId
);

string_id!(
    /// Opaque, stable identifier of a user (shared by both Spaces)
    UserId
);

string_id!(
    /// Identifier of a marker within one Space
    MarkerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_id_display() {
        let id = SpaceId::from("1234567890");
        assert_eq!(format!("{}", id), "1234567890");
        assert_eq!(id.as_str(), "1234567890");
    }

    #[test]
    fn test_blank_ids() {
        assert!(UserId::new("").is_blank());
        assert!(UserId::new("   ").is_blank());
        assert!(!UserId::new("42").is_blank());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = UserId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");

        let back: UserId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, id);
    }
}
