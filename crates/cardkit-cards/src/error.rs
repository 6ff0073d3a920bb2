//! # Card Error Types

use cardkit_core::{CanonicalizationError, CardId, ValidationError};
use thiserror::Error;

use crate::model::SignerType;

/// Why a raw card could not become a [`Card`](crate::Card).
#[derive(Error, Debug)]
pub enum CardParseError {
    #[error("card identity is empty")]
    EmptyIdentity,

    #[error("card public key is empty")]
    EmptyPublicKey,

    #[error("card id: {0}")]
    InvalidCardId(#[source] ValidationError),

    #[error("previous card id: {0}")]
    InvalidPreviousCardId(#[source] ValidationError),

    /// The id the directory sent is not the hash of the card content.
    #[error("card id {received} does not match content hash {computed}")]
    IdMismatch { computed: CardId, received: CardId },

    #[error("card content cannot be canonicalized: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Trust failures. Always fatal to the operation that produced them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    /// The card has no signature entry of a required signer type.
    #[error("card has no {0} signature")]
    SignatureMissing(SignerType),

    /// Entries of a required signer type exist but none verifies.
    #[error("card {0} signature is invalid")]
    SignatureInvalid(SignerType),
}

/// Errors from adding a signature to a raw card.
#[derive(Error, Debug)]
pub enum SignerError {
    /// A signature of this signer type is already present.
    #[error("card already carries a {0} signature")]
    DuplicateSignature(SignerType),

    #[error("card content cannot be canonicalized: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
