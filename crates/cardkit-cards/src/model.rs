//! # Card Model
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "id": "<hex sha256>",
//!   "identity": "alice",
//!   "public_key": "<base64>",
//!   "created_at": 1515686245,
//!   "version": "5.0",
//!   "previous_card_id": "<hex sha256>",
//!   "signatures": [
//!     { "signer_id": "...", "signer_type": "self", "signature": "<base64>",
//!       "extra_fields": { "k": "v" } }
//!   ]
//! }
//! ```
//!
//! The card id is the SHA-256 of the canonical bytes of [`CardContent`].
//! Each signature covers the canonical bytes of
//! `{"content": <CardContent>, "extra_fields": {...}}`, with
//! `extra_fields` omitted when empty.

use std::collections::BTreeMap;

use cardkit_core::{CanonicalBytes, CanonicalizationError, CardId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CardParseError;

/// Card format version stamped on new cards.
pub const CARD_VERSION: &str = "5.0";

/// The role of a signature's issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignerType {
    /// The identity itself, with the card's own key.
    #[serde(rename = "self")]
    SelfSigned,
    /// The directory service.
    #[serde(rename = "issuer")]
    Issuer,
    /// A relying-party-controlled signer.
    #[serde(rename = "application")]
    Application,
}

impl SignerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfSigned => "self",
            Self::Issuer => "issuer",
            Self::Application => "application",
        }
    }
}

impl std::fmt::Display for SignerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One signature entry on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSignature {
    pub signer_id: String,
    pub signer_type: SignerType,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    /// Signed alongside the card content.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_fields: BTreeMap<String, String>,
}

/// The hashed part of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardContent {
    pub identity: String,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    pub created_at: i64,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_card_id: Option<String>,
}

impl CardContent {
    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    pub fn card_id(&self) -> Result<CardId, CanonicalizationError> {
        Ok(CardId::from_content(&self.canonical_bytes()?))
    }
}

#[derive(Serialize)]
struct SignedMaterial<'a> {
    content: &'a CardContent,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    extra_fields: &'a BTreeMap<String, String>,
}

/// The bytes a signature over `content` with `extra_fields` covers.
pub fn signing_material(
    content: &CardContent,
    extra_fields: &BTreeMap<String, String>,
) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&SignedMaterial {
        content,
        extra_fields,
    })
}

/// A card as exchanged with the directory. Nothing here is trusted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCard {
    /// Set by the directory; absent on cards that were never published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub identity: String,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    pub created_at: i64,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_card_id: Option<String>,
    #[serde(default)]
    pub signatures: Vec<CardSignature>,
}

impl RawCard {
    /// A new unsigned card created now.
    pub fn new(
        identity: impl Into<String>,
        public_key: Vec<u8>,
        previous_card_id: Option<&CardId>,
    ) -> Self {
        Self::new_at(identity, public_key, previous_card_id, Utc::now())
    }

    /// A new unsigned card with an explicit creation time.
    pub fn new_at(
        identity: impl Into<String>,
        public_key: Vec<u8>,
        previous_card_id: Option<&CardId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            identity: identity.into(),
            public_key,
            created_at: created_at.timestamp(),
            version: CARD_VERSION.to_string(),
            previous_card_id: previous_card_id.map(|id| id.as_str().to_string()),
            signatures: Vec::new(),
        }
    }

    pub fn content(&self) -> CardContent {
        CardContent {
            identity: self.identity.clone(),
            public_key: self.public_key.clone(),
            created_at: self.created_at,
            version: self.version.clone(),
            previous_card_id: self.previous_card_id.clone(),
        }
    }
}

/// A card whose structure and content hash have been checked.
///
/// Signatures are *not* checked here; that is [`CardVerifier`](crate::CardVerifier)'s job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: CardId,
    content: CardContent,
    previous_card_id: Option<CardId>,
    signatures: Vec<CardSignature>,
}

impl Card {
    /// Validate a raw card.
    ///
    /// The id is recomputed from the content. If the raw card carries an id,
    /// it must match.
    pub fn parse(raw: RawCard) -> Result<Self, CardParseError> {
        if raw.identity.is_empty() {
            return Err(CardParseError::EmptyIdentity);
        }
        if raw.public_key.is_empty() {
            return Err(CardParseError::EmptyPublicKey);
        }
        let previous_card_id = raw
            .previous_card_id
            .as_deref()
            .map(CardId::parse)
            .transpose()
            .map_err(CardParseError::InvalidPreviousCardId)?;

        let content = raw.content();
        let computed = content.card_id()?;
        if let Some(received) = raw.id.as_deref() {
            let received = CardId::parse(received).map_err(CardParseError::InvalidCardId)?;
            if received != computed {
                return Err(CardParseError::IdMismatch { computed, received });
            }
        }

        Ok(Self {
            id: computed,
            content,
            previous_card_id,
            signatures: raw.signatures,
        })
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn identity(&self) -> &str {
        &self.content.identity
    }

    pub fn public_key(&self) -> &[u8] {
        &self.content.public_key
    }

    pub fn created_at(&self) -> i64 {
        self.content.created_at
    }

    pub fn version(&self) -> &str {
        &self.content.version
    }

    pub fn previous_card_id(&self) -> Option<&CardId> {
        self.previous_card_id.as_ref()
    }

    pub fn signatures(&self) -> &[CardSignature] {
        &self.signatures
    }

    pub fn content(&self) -> &CardContent {
        &self.content
    }

    /// Back to the wire envelope, id included.
    pub fn to_raw(&self) -> RawCard {
        RawCard {
            id: Some(self.id.as_str().to_string()),
            identity: self.content.identity.clone(),
            public_key: self.content.public_key.clone(),
            created_at: self.content.created_at,
            version: self.content.version.clone(),
            previous_card_id: self.content.previous_card_id.clone(),
            signatures: self.signatures.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn relink_for_test(&mut self, previous: CardId) {
        self.content.previous_card_id = Some(previous.as_str().to_string());
        self.previous_card_id = Some(previous);
    }
}

pub(crate) mod base64_bytes {
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64_STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(identity: &str) -> RawCard {
        RawCard::new_at(
            identity,
            vec![7u8; 32],
            None,
            DateTime::from_timestamp(1_515_686_245, 0).unwrap(),
        )
    }

    #[test]
    fn new_card_is_unsigned_version_5() {
        let r = raw("alice");
        assert_eq!(r.version, "5.0");
        assert!(r.id.is_none());
        assert!(r.signatures.is_empty());
    }

    #[test]
    fn json_shape_matches_wire_format() {
        let mut r = raw("alice");
        r.signatures.push(CardSignature {
            signer_id: "x".into(),
            signer_type: SignerType::SelfSigned,
            signature: vec![1, 2, 3],
            extra_fields: BTreeMap::new(),
        });
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["public_key"], "BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc=");
        assert_eq!(v["signatures"][0]["signer_type"], "self");
        assert_eq!(v["signatures"][0]["signature"], "AQID");
        assert!(v.get("id").is_none());
        assert!(v.get("previous_card_id").is_none());
        assert!(v["signatures"][0].get("extra_fields").is_none());
    }

    #[test]
    fn signer_type_wire_names() {
        for (t, s) in [
            (SignerType::SelfSigned, "\"self\""),
            (SignerType::Issuer, "\"issuer\""),
            (SignerType::Application, "\"application\""),
        ] {
            assert_eq!(serde_json::to_string(&t).unwrap(), s);
            assert_eq!(serde_json::from_str::<SignerType>(s).unwrap(), t);
        }
        assert!(serde_json::from_str::<SignerType>("\"virgil\"").is_err());
    }

    #[test]
    fn parse_computes_id_when_absent() {
        let r = raw("alice");
        let expected = r.content().card_id().unwrap();
        let card = Card::parse(r).unwrap();
        assert_eq!(card.id(), &expected);
        assert_eq!(card.identity(), "alice");
    }

    #[test]
    fn parse_accepts_matching_id() {
        let mut r = raw("alice");
        r.id = Some(r.content().card_id().unwrap().to_string());
        assert!(Card::parse(r).is_ok());
    }

    #[test]
    fn parse_rejects_id_that_is_not_the_content_hash() {
        let mut r = raw("alice");
        r.id = Some("ab".repeat(32));
        assert!(matches!(
            Card::parse(r),
            Err(CardParseError::IdMismatch { .. })
        ));
    }

    #[test]
    fn parse_rejects_structural_defects() {
        assert!(matches!(Card::parse(raw("")), Err(CardParseError::EmptyIdentity)));

        let mut r = raw("alice");
        r.public_key.clear();
        assert!(matches!(Card::parse(r), Err(CardParseError::EmptyPublicKey)));

        let mut r = raw("alice");
        r.previous_card_id = Some("not-a-card-id".into());
        assert!(matches!(
            Card::parse(r),
            Err(CardParseError::InvalidPreviousCardId(_))
        ));

        let mut r = raw("alice");
        r.id = Some("short".into());
        assert!(matches!(Card::parse(r), Err(CardParseError::InvalidCardId(_))));
    }

    #[test]
    fn previous_card_id_changes_the_id() {
        let a = Card::parse(raw("alice")).unwrap();
        let b = RawCard::new_at(
            "alice",
            vec![7u8; 32],
            Some(a.id()),
            DateTime::from_timestamp(1_515_686_245, 0).unwrap(),
        );
        let b = Card::parse(b).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.previous_card_id(), Some(a.id()));
    }

    #[test]
    fn signing_material_wraps_content_and_extra_fields() {
        let content = raw("bob").content();
        let plain = signing_material(&content, &BTreeMap::new()).unwrap();
        let s = std::str::from_utf8(plain.as_bytes()).unwrap();
        assert!(s.starts_with(r#"{"content":{"created_at":1515686245,"identity":"bob""#));
        assert!(!s.contains("extra_fields"));

        let extra = BTreeMap::from([("device".to_string(), "phone".to_string())]);
        let with_extra = signing_material(&content, &extra).unwrap();
        assert!(std::str::from_utf8(with_extra.as_bytes())
            .unwrap()
            .ends_with(r#""extra_fields":{"device":"phone"}}"#));
    }

    #[test]
    fn to_raw_roundtrips_through_json_and_parse() {
        let card = Card::parse(raw("carol")).unwrap();
        let json = serde_json::to_string(&card.to_raw()).unwrap();
        let back: RawCard = serde_json::from_str(&json).unwrap();
        assert_eq!(Card::parse(back).unwrap(), card);
    }
}
