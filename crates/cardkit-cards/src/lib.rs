//! # cardkit-cards: Cards, Trust Policy and Supersession Chains
//!
//! A card binds an identity to a public key. It may supersede an earlier
//! card of the same identity (`previous_card_id`) and carries signatures
//! from several signer roles.
//!
//! - [`RawCard`] is the JSON envelope exchanged with the directory.
//! - [`Card`] is a raw card whose content hash, identity and references have
//!   been checked ([`Card::parse`]).
//! - [`CardVerifier`] decides whether a parsed card's signatures satisfy a
//!   configured policy. Pure predicate, no I/O.
//! - [`ChainResolver`] turns one search batch into chain heads.
//! - [`ModelSigner`] adds signatures to raw cards before publishing.

pub mod error;
pub mod model;
pub mod resolver;
pub mod signer;
pub mod verifier;

pub use error::{CardParseError, SignerError, VerificationError};
pub use model::{
    signing_material, Card, CardContent, CardSignature, RawCard, SignerType, CARD_VERSION,
};
pub use resolver::{ChainResolver, ResolvedBatch};
pub use signer::ModelSigner;
pub use verifier::{CardVerifier, TrustedKeys};
