//! # Token Issuance and Verification
//!
//! Issuer-side counterpart to the codec. A generator stamps `iat`/`exp`,
//! builds the unsigned token and attaches an Ed25519 signature over its
//! snapshot. A verifier checks the header algorithm and the signature.

use std::collections::BTreeMap;
use std::sync::Arc;

use cardkit_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Verifier, SignatureVerifier};
use chrono::{DateTime, Duration, Utc};

use crate::error::TokenError;
use crate::token::{AccessToken, TokenBody, TokenHeader};

/// Signature algorithm name carried in the token header.
pub const TOKEN_ALGORITHM: &str = "EdDSA";
/// Token type carried in the token header.
pub const TOKEN_TYPE: &str = "JWT";
/// Content type carried in the token header.
pub const TOKEN_CONTENT_TYPE: &str = "virgil-jwt;v=1";

/// Issues signed access tokens with a fixed time to live.
#[derive(Debug)]
pub struct TokenGenerator {
    key: Ed25519KeyPair,
    key_id: Option<String>,
    ttl: Duration,
}

impl TokenGenerator {
    pub fn new(key: Ed25519KeyPair, key_id: Option<String>, ttl: Duration) -> Self {
        Self { key, key_id, ttl }
    }

    /// Issue a token for `identity`, valid from now for the configured TTL.
    pub fn generate_token(
        &self,
        identity: &str,
        data: BTreeMap<String, String>,
    ) -> Result<AccessToken, TokenError> {
        self.generate_token_at(identity, data, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn generate_token_at(
        &self,
        identity: &str,
        data: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        let header = TokenHeader {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
            cty: Some(TOKEN_CONTENT_TYPE.to_string()),
            kid: self.key_id.clone(),
        };
        let issued_at = now.timestamp();
        let body = TokenBody {
            identity: identity.to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
            sub: format!("identity-{identity}"),
            data,
        };

        let unsigned = AccessToken::new(header, body)?;
        let signature = self.key.sign(&unsigned.snapshot());
        tracing::debug!(identity, exp = unsigned.body().exp, "issued access token");
        unsigned.with_signature(signature.to_vec())
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.key.public_key()
    }
}

/// Checks that a token was signed by a given issuer key.
pub struct TokenVerifier {
    verifier: Arc<dyn SignatureVerifier>,
    public_key: Vec<u8>,
    algorithm: String,
}

impl TokenVerifier {
    /// Verifier for Ed25519 tokens signed by `public_key`.
    pub fn ed25519(public_key: &Ed25519PublicKey) -> Self {
        Self {
            verifier: Arc::new(Ed25519Verifier),
            public_key: public_key.as_bytes().to_vec(),
            algorithm: TOKEN_ALGORITHM.to_string(),
        }
    }

    /// Verifier using a caller-supplied signature capability.
    pub fn with_verifier(
        verifier: Arc<dyn SignatureVerifier>,
        public_key: Vec<u8>,
        algorithm: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            public_key,
            algorithm: algorithm.into(),
        }
    }

    /// Verify the token's algorithm and signature. Expiry is not checked.
    pub fn verify(&self, token: &AccessToken) -> Result<(), TokenError> {
        if token.header().alg != self.algorithm {
            return Err(TokenError::UnsupportedAlgorithm(token.header().alg.clone()));
        }
        let signature = token.signature().ok_or(TokenError::Unsigned)?;
        if self
            .verifier
            .verify(token.snapshot().as_bytes(), signature, &self.public_key)
        {
            Ok(())
        } else {
            Err(TokenError::InvalidSignature)
        }
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
