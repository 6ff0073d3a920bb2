//! # Ed25519 Signing and Verification
//!
//! Ed25519 keys and signatures for card self-signatures, issuer signatures
//! and access-token signatures.
//!
//! ## Security Invariant
//!
//! - Signing input must implement [`SigningInput`]. Implementations exist
//!   only for canonical card bytes here and for the token snapshot in
//!   `cardkit-token`, so arbitrary byte buffers cannot be signed by accident.
//! - Private keys are never serialized or logged. `Ed25519KeyPair` does not
//!   implement `Serialize` and its `Debug` output is redacted.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as lowercase hex strings.

use cardkit_core::CanonicalBytes;
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;

/// A message that may be signed: bytes produced by an agreed, deterministic
/// encoding.
pub trait SigningInput {
    /// The exact bytes that are signed and verified.
    fn signing_bytes(&self) -> &[u8];
}

impl SigningInput for CanonicalBytes {
    fn signing_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// An Ed25519 public key (32 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519PublicKey(pub [u8; 32]);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Ed25519Signature(pub [u8; 64]);

/// An Ed25519 key pair for signing operations.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

// ---------------------------------------------------------------------------
// Ed25519PublicKey impls
// ---------------------------------------------------------------------------

impl Ed25519PublicKey {
    /// Create a public key from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a public key from a byte slice as carried in card JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Return the raw 32-byte public key.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the public key as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse a public key from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim().to_lowercase();
        if hex.len() != 64 {
            return Err(CryptoError::InvalidPublicKey(format!(
                "public key hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(&hex)?;
        Self::from_slice(&bytes)
    }

    /// Convert to an `ed25519_dalek::VerifyingKey`.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519PublicKey({}...)", to_hex(&self.0[..4]))
    }
}

impl std::fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature impls
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create a signature from a byte slice as carried in card or token data.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Return the raw 64-byte signature.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Copy the signature into an owned buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Render the signature as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", to_hex(&self.0[..4]))
    }
}

// ---------------------------------------------------------------------------
// Ed25519KeyPair impls
// ---------------------------------------------------------------------------

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a key pair from a raw 32-byte private key seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Create a key pair from a 64-character hex private key seed.
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(hex.trim())?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::HexDecode(format!("seed must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the public key of this key pair.
    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an agreed signing input.
    pub fn sign(&self, data: &impl SigningInput) -> Ed25519Signature {
        let sig = self.signing_key.sign(data.signing_bytes());
        Ed25519Signature(sig.to_bytes())
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519KeyPair(<private>)")
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature over a signing input.
pub fn verify(
    data: &impl SigningInput,
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    verify_bytes(data.signing_bytes(), signature, public_key)
}

pub(crate) fn verify_bytes(
    message: &[u8],
    signature: &Ed25519Signature,
    public_key: &Ed25519PublicKey,
) -> Result<(), CryptoError> {
    let vk = public_key.to_verifying_key()?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    vk.verify(message, &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CryptoError> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(CryptoError::HexDecode(
            "hex string must be ASCII with even length".to_string(),
        ));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| CryptoError::HexDecode(format!("invalid hex at position {i}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(v: serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::new(&v).unwrap()
    }

    #[test]
    fn sign_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"identity": "alice", "created_at": 1}));
        let sig = kp.sign(&data);
        verify(&data, &sig, &kp.public_key()).expect("valid signature should verify");
    }

    #[test]
    fn verify_with_wrong_key_fails() {
        let kp1 = Ed25519KeyPair::generate();
        let kp2 = Ed25519KeyPair::generate();
        let data = canonical(serde_json::json!({"identity": "alice"}));
        let sig = kp1.sign(&data);
        assert!(verify(&data, &sig, &kp2.public_key()).is_err());
    }

    #[test]
    fn verify_tampered_message_fails() {
        let kp = Ed25519KeyPair::generate();
        let sig = kp.sign(&canonical(serde_json::json!({"identity": "alice"})));
        let tampered = canonical(serde_json::json!({"identity": "mallory"}));
        assert!(verify(&tampered, &sig, &kp.public_key()).is_err());
    }

    #[test]
    fn seed_is_deterministic() {
        let seed = [7u8; 32];
        let kp1 = Ed25519KeyPair::from_seed(&seed);
        let kp2 = Ed25519KeyPair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        let data = canonical(serde_json::json!({"x": 1}));
        assert_eq!(kp1.sign(&data), kp2.sign(&data));
    }

    #[test]
    fn public_key_hex_and_serde_roundtrip() {
        let pk = Ed25519KeyPair::generate().public_key();
        assert_eq!(Ed25519PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json.len(), 64 + 2);
        let back: Ed25519PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
    }

    #[test]
    fn seed_hex_matches_raw_seed() {
        let kp = Ed25519KeyPair::from_seed_hex(&"0f".repeat(32)).unwrap();
        assert_eq!(kp.public_key(), Ed25519KeyPair::from_seed(&[0x0f; 32]).public_key());
        assert!(Ed25519KeyPair::from_seed_hex("abc").is_err());
        assert!(Ed25519KeyPair::from_seed_hex(&"0f".repeat(31)).is_err());
        assert!(Ed25519KeyPair::from_seed_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(Ed25519PublicKey::from_hex("not-hex").is_err());
        assert!(Ed25519PublicKey::from_hex(&"zz".repeat(32)).is_err());
        assert!(Ed25519PublicKey::from_slice(&[0u8; 31]).is_err());
        assert!(matches!(
            Ed25519Signature::from_slice(&[0u8; 10]),
            Err(CryptoError::InvalidSignatureLength(10))
        ));
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let kp = Ed25519KeyPair::generate();
        assert_eq!(format!("{kp:?}"), "Ed25519KeyPair(<private>)");
    }
}
