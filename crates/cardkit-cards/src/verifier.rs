//! # Card Verifier
//!
//! A policy is a set of required signer types, each with the signature
//! capability to use and where its public keys come from. A card passes
//! when every required type has at least one signature that verifies.
//! Signatures of types the policy does not mention are ignored.

use std::collections::BTreeMap;
use std::sync::Arc;

use cardkit_crypto::{Ed25519PublicKey, Ed25519Verifier, SignatureVerifier};

use crate::error::VerificationError;
use crate::model::{signing_material, Card, CardSignature, SignerType};

/// Where the public key for a signature entry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustedKeys {
    /// The card's own public key (self signatures).
    CardKey,
    /// Trust anchors by signer id. A signer id not listed never verifies.
    Anchors(BTreeMap<String, Vec<u8>>),
}

struct SignerRule {
    verifier: Arc<dyn SignatureVerifier>,
    keys: TrustedKeys,
}

/// Multi-signer trust policy.
#[derive(Default)]
pub struct CardVerifier {
    rules: BTreeMap<SignerType, SignerRule>,
}

impl CardVerifier {
    /// A policy with no requirements. Accepts every card.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a passing signature of `signer_type`.
    pub fn require(
        mut self,
        signer_type: SignerType,
        verifier: Arc<dyn SignatureVerifier>,
        keys: TrustedKeys,
    ) -> Self {
        self.rules.insert(signer_type, SignerRule { verifier, keys });
        self
    }

    /// Ed25519 policy requiring a self signature and a signature from the
    /// given issuer key.
    pub fn ed25519_self_and_issuer(issuer_id: impl Into<String>, issuer_key: &Ed25519PublicKey) -> Self {
        let ed25519: Arc<dyn SignatureVerifier> = Arc::new(Ed25519Verifier);
        let anchors = BTreeMap::from([(issuer_id.into(), issuer_key.as_bytes().to_vec())]);
        Self::new()
            .require(SignerType::SelfSigned, Arc::clone(&ed25519), TrustedKeys::CardKey)
            .require(SignerType::Issuer, ed25519, TrustedKeys::Anchors(anchors))
    }

    /// Signer types this policy requires, in check order.
    pub fn required_types(&self) -> impl Iterator<Item = SignerType> + '_ {
        self.rules.keys().copied()
    }

    /// Check `card` against the policy.
    ///
    /// # Errors
    ///
    /// For the first failing required type (in [`SignerType`] order):
    /// [`VerificationError::SignatureMissing`] if the card has no entry of
    /// that type, [`VerificationError::SignatureInvalid`] if it has entries
    /// but none verifies.
    pub fn verify(&self, card: &Card) -> Result<(), VerificationError> {
        for (&signer_type, rule) in &self.rules {
            let mut entries = card
                .signatures()
                .iter()
                .filter(|s| s.signer_type == signer_type)
                .peekable();
            if entries.peek().is_none() {
                return Err(VerificationError::SignatureMissing(signer_type));
            }
            if !entries.any(|entry| rule.accepts(card, entry)) {
                return Err(VerificationError::SignatureInvalid(signer_type));
            }
        }
        Ok(())
    }
}

impl SignerRule {
    fn accepts(&self, card: &Card, entry: &CardSignature) -> bool {
        let key = match &self.keys {
            TrustedKeys::CardKey => card.public_key(),
            TrustedKeys::Anchors(anchors) => match anchors.get(&entry.signer_id) {
                Some(key) => key.as_slice(),
                None => return false,
            },
        };
        // Content already canonicalized during parse; extra fields are strings.
        let Ok(material) = signing_material(card.content(), &entry.extra_fields) else {
            return false;
        };
        self.verifier
            .verify(material.as_bytes(), &entry.signature, key)
    }
}

impl std::fmt::Debug for CardVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardVerifier")
            .field("required", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}
