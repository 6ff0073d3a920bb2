//! # Card Identifier Newtype
//!
//! A [`CardId`] is never invented by the client: it is either recomputed
//! from canonical card content or parsed from a reference the directory
//! returned (`previous_card_id`). Keeping it a distinct type stops an
//! identity string from being passed where a card id is expected.

use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical::CanonicalBytes;
use crate::digest::sha256_hex;
use crate::error::ValidationError;

/// Content-derived identifier of a card: lowercase hex SHA-256 of the
/// card's canonical content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Derive the identifier for the given canonical content.
    pub fn from_content(content: &CanonicalBytes) -> Self {
        Self(sha256_hex(content))
    }

    /// Parse an identifier received from the directory.
    ///
    /// Uppercase hex is accepted and normalized to lowercase.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.len() != 64 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidCardId(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Access the hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CardId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for CardId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_content_matches_sha256_hex() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        let id = CardId::from_content(&cb);
        assert_eq!(
            id.as_str(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn parse_normalizes_case() {
        let upper = "44136FA355B3678A1146AD16F7E8649E94FB4FC21FE77E8310C060F61CAAFF8A";
        let id = CardId::parse(upper).unwrap();
        assert_eq!(id.as_str(), upper.to_ascii_lowercase());
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(CardId::parse("abc").is_err());
        assert!(CardId::parse(&"g".repeat(64)).is_err());
    }

    #[test]
    fn serde_is_a_bare_string() {
        let id = CardId::parse(&"ab".repeat(32)).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: CardId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<CardId>("\"nope\"").is_err());
    }
}
