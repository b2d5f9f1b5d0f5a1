//! Resource primary keys and their external text form.
//!
//! Ids are UUID v4 values rendered as 36 lowercase hyphenated characters.
//! Only that exact spelling decodes, so a decoded id always renders back to
//! the string it came from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Length of the canonical hyphenated text form
const ENCODED_LEN: usize = 36;

/// Returned when a raw id string is not a canonical resource id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resource id: {0:?}")]
pub struct InvalidId(pub String);

/// Store-assigned primary key of a resource document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Decode the external text form.
    pub fn decode(raw: &str) -> Result<Self, InvalidId> {
        let invalid = || InvalidId(raw.to_string());

        if raw.len() != ENCODED_LEN {
            return Err(invalid());
        }

        let uuid = Uuid::try_parse(raw).map_err(|_| invalid())?;
        // try_parse is case-insensitive; insist on the exact form we emit
        if uuid.hyphenated().to_string() != raw {
            return Err(invalid());
        }

        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ResourceId::decode(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_decode_to_themselves() {
        let id = ResourceId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), ENCODED_LEN);
        assert_eq!(ResourceId::decode(&text), Ok(id));
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in [
            "",
            "not-a-valid-id",
            "abc123",
            // simple (unhyphenated) form
            "67e5504410b1426f9247bb680e5fe0c8",
            // uppercase hex
            "67E55044-10B1-426F-9247-BB680E5FE0C8",
            // braced
            "{67e55044-10b1-426f-9247-bb680e5fe0c8}",
            // non-hex digit
            "67e55044-10b1-426f-9247-bb680e5fe0cg",
            // trailing garbage
            "67e55044-10b1-426f-9247-bb680e5fe0c8 ",
        ] {
            assert_eq!(
                ResourceId::decode(raw),
                Err(InvalidId(raw.to_string())),
                "{raw:?} should not decode"
            );
        }
    }

    #[test]
    fn serializes_as_string() {
        let id = ResourceId::decode("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(serde_json::from_value::<ResourceId>(json).unwrap(), id);
    }
}
