use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
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
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Scheduled match.
    GameId
);
string_id!(TeamId);
string_id!(PlayerId);
string_id!(
    /// Field position within a formation ("GK", "CB", "LW", ...).
    PositionId
);
string_id!(
    /// Key of a stored row that is not itself a game.
    RecordId
);

impl RecordId {
    /// Fresh random key for a row created by this crate.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = PlayerId::from("p-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p-7\"");
        let back: PlayerId = serde_json::from_str("\"p-7\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_generated_record_ids_are_unique() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }
}
