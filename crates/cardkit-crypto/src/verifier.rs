//! # Signature Verification Capability
//!
//! The card verifier is configured with a [`SignatureVerifier`] per signer
//! type. It answers one question: does `signature` verify `message` under
//! `public_key`? Malformed keys or signatures answer `false`, never an error.

use crate::ed25519::{verify_bytes, Ed25519PublicKey, Ed25519Signature};

/// Abstract `verify(data, signature, public_key) -> bool` capability.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `true` only when `signature` is a valid signature over
    /// `message` by the holder of `public_key`.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// Ed25519 implementation of [`SignatureVerifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let Ok(public_key) = Ed25519PublicKey::from_slice(public_key) else {
            return false;
        };
        let Ok(signature) = Ed25519Signature::from_slice(signature) else {
            return false;
        };
        verify_bytes(message, &signature, &public_key).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::Ed25519KeyPair;
    use cardkit_core::CanonicalBytes;

    fn signed() -> (CanonicalBytes, Vec<u8>, Vec<u8>) {
        let kp = Ed25519KeyPair::from_seed(&[3u8; 32]);
        let data = CanonicalBytes::new(&serde_json::json!({"identity": "bob"})).unwrap();
        let sig = kp.sign(&data).to_vec();
        (data, sig, kp.public_key().as_bytes().to_vec())
    }

    #[test]
    fn accepts_valid_signature() {
        let (data, sig, pk) = signed();
        assert!(Ed25519Verifier.verify(data.as_bytes(), &sig, &pk));
    }

    #[test]
    fn rejects_flipped_bit() {
        let (data, mut sig, pk) = signed();
        sig[0] ^= 0x01;
        assert!(!Ed25519Verifier.verify(data.as_bytes(), &sig, &pk));
    }

    #[test]
    fn malformed_material_is_false_not_panic() {
        let (data, sig, pk) = signed();
        assert!(!Ed25519Verifier.verify(data.as_bytes(), &sig[..10], &pk));
        assert!(!Ed25519Verifier.verify(data.as_bytes(), &sig, &pk[..5]));
        assert!(!Ed25519Verifier.verify(data.as_bytes(), &[], &[]));
    }

    #[test]
    fn usable_as_trait_object() {
        let (data, sig, pk) = signed();
        let v: std::sync::Arc<dyn SignatureVerifier> = std::sync::Arc::new(Ed25519Verifier);
        assert!(v.verify(data.as_bytes(), &sig, &pk));
    }
}
