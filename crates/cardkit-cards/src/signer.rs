//! # Model Signer
//!
//! Appends signatures to a raw card before it is published. The self
//! signature's signer id is the card id.

use std::collections::BTreeMap;

use cardkit_crypto::Ed25519KeyPair;

use crate::error::SignerError;
use crate::model::{signing_material, CardSignature, RawCard, SignerType};

/// Signs raw cards with Ed25519 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelSigner;

impl ModelSigner {
    /// Add the `self` signature, made with the key pair whose public key the
    /// card carries.
    pub fn self_sign(
        raw: &mut RawCard,
        key: &Ed25519KeyPair,
        extra_fields: BTreeMap<String, String>,
    ) -> Result<(), SignerError> {
        let card_id = raw.content().card_id()?;
        Self::sign(raw, card_id.as_str(), SignerType::SelfSigned, key, extra_fields)
    }

    /// Add a signature of `signer_type`.
    ///
    /// # Errors
    ///
    /// [`SignerError::DuplicateSignature`] if the card already carries a
    /// signature of that type.
    pub fn sign(
        raw: &mut RawCard,
        signer_id: &str,
        signer_type: SignerType,
        key: &Ed25519KeyPair,
        extra_fields: BTreeMap<String, String>,
    ) -> Result<(), SignerError> {
        if raw.signatures.iter().any(|s| s.signer_type == signer_type) {
            return Err(SignerError::DuplicateSignature(signer_type));
        }
        let material = signing_material(&raw.content(), &extra_fields)?;
        let signature = key.sign(&material);
        raw.signatures.push(CardSignature {
            signer_id: signer_id.to_string(),
            signer_type,
            signature: signature.to_vec(),
            extra_fields,
        });
        Ok(())
    }
}
