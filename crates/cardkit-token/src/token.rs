//! # Access Token Codec
//!
//! Canonical string: `base64url(header-JSON) "." base64url(body-JSON)`,
//! optionally followed by `"." base64url(signature)`. All segments are
//! unpadded base64url.
//!
//! A decoded token keeps the segments it was decoded from, so the snapshot
//! a verifier checks is byte-for-byte the prefix the issuer signed, even if
//! the issuer's JSON key order differs from ours.

use std::collections::BTreeMap;

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use cardkit_crypto::SigningInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Token header. Fixed per issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm, e.g. `"EdDSA"`.
    pub alg: String,
    /// Token type, e.g. `"JWT"`.
    pub typ: String,
    /// Content type, e.g. `"virgil-jwt;v=1"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
    /// Identifier of the issuer key that signed the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// Token body: who the token is for and when it is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBody {
    pub identity: String,
    /// Issued at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expires at, seconds since the Unix epoch.
    pub exp: i64,
    pub sub: String,
    /// Additional application data.
    #[serde(rename = "ada", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

/// The signature-free two-segment prefix of a token, as UTF-8 bytes.
///
/// The only message a token signer signs and a token verifier checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot(Vec<u8>);

impl TokenSnapshot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl SigningInput for TokenSnapshot {
    fn signing_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A parsed or freshly built access token.
///
/// Immutable apart from a single late-bound signature attachment
/// ([`AccessToken::with_signature`]).
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    header: TokenHeader,
    body: TokenBody,
    signature: Option<Vec<u8>>,
    header_segment: String,
    body_segment: String,
}

impl AccessToken {
    /// Build an unsigned token from its header and body.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Corrupt`] if either part cannot be serialized.
    pub fn new(header: TokenHeader, body: TokenBody) -> Result<Self, TokenError> {
        let header_segment = encode_segment(&header, "header")?;
        let body_segment = encode_segment(&body, "body")?;
        Ok(Self {
            header,
            body,
            signature: None,
            header_segment,
            body_segment,
        })
    }

    /// Decode a token from its canonical string. Segments after the third
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] when the string has fewer than two
    /// segments, when a header or body segment is not base64url JSON of the
    /// expected shape, or when the signature segment is not base64url.
    pub fn decode(s: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = s.split('.').collect();
        if segments.len() < 2 {
            return Err(TokenError::Malformed(format!(
                "expected at least 2 segments, got {}",
                segments.len()
            )));
        }
        if segments.len() > 3 {
            tracing::debug!(segments = segments.len(), "ignoring trailing token segments");
        }

        let header: TokenHeader = decode_segment(segments[0], "header")?;
        let body: TokenBody = decode_segment(segments[1], "body")?;
        let signature = match segments.get(2) {
            Some(sig) => Some(
                BASE64_URL_SAFE_NO_PAD
                    .decode(sig)
                    .map_err(|e| TokenError::Malformed(format!("signature segment: {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            header,
            body,
            signature,
            header_segment: segments[0].to_string(),
            body_segment: segments[1].to_string(),
        })
    }

    /// Render the canonical string, including the signature segment when
    /// one is attached.
    pub fn encode(&self) -> String {
        let mut out = format!("{}.{}", self.header_segment, self.body_segment);
        if let Some(sig) = &self.signature {
            out.push('.');
            out.push_str(&BASE64_URL_SAFE_NO_PAD.encode(sig));
        }
        out
    }

    /// The exact two-segment prefix, whether or not a signature is attached.
    pub fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot(format!("{}.{}", self.header_segment, self.body_segment).into_bytes())
    }

    /// Attach the signature over [`AccessToken::snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::AlreadySigned`] if a signature is already
    /// attached.
    pub fn with_signature(mut self, signature: Vec<u8>) -> Result<Self, TokenError> {
        if self.signature.is_some() {
            return Err(TokenError::AlreadySigned);
        }
        self.signature = Some(signature);
        Ok(self)
    }

    /// True iff `now` is at or after the expiry second.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.body.exp
    }

    /// [`AccessToken::is_expired_at`] against the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    pub fn body(&self) -> &TokenBody {
        &self.body
    }

    pub fn identity(&self) -> &str {
        &self.body.identity
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    /// Expiry as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.body.exp, 0)
    }
}

impl std::fmt::Debug for AccessToken {
    // The encoded form is a bearer credential; keep it out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("header", &self.header)
            .field("identity", &self.body.identity)
            .field("exp", &self.body.exp)
            .field("signed", &self.signature.is_some())
            .finish()
    }
}

impl std::str::FromStr for AccessToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn encode_segment<T: Serialize>(part: &T, name: &str) -> Result<String, TokenError> {
    let json =
        serde_json::to_vec(part).map_err(|e| TokenError::Corrupt(format!("{name}: {e}")))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: serde::de::DeserializeOwned>(
    segment: &str,
    name: &str,
) -> Result<T, TokenError> {
    let json = BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{name} segment: {e}")))?;
    serde_json::from_slice(&json).map_err(|e| TokenError::Malformed(format!("{name} segment: {e}")))
}
