//! # cardkit-crypto: Cryptographic Primitives for cardkit
//!
//! - **Ed25519** key pairs, public keys and signatures used to sign card
//!   content and access tokens.
//! - **[`SignatureVerifier`]**, the abstract `verify(data, signature, key)`
//!   capability the card verifier is configured with. Byte-level crypto stays
//!   behind this trait; the card layer never touches a concrete algorithm.

pub mod ed25519;
pub mod error;
pub mod verifier;

// Re-export primary types.
pub use ed25519::{verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, SigningInput};
pub use error::CryptoError;
pub use verifier::{Ed25519Verifier, SignatureVerifier};
