//! # Card Manager Error Types

use std::time::Duration;

use cardkit_cards::{CardParseError, SignerError, VerificationError};
use cardkit_client::CardClientError;
use cardkit_core::CardId;
use cardkit_token::TokenProviderError;
use thiserror::Error;

/// Misuse or failure of a [`CallbackOperation`](crate::CallbackOperation).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// `start` or `run` was called on an operation that already started.
    #[error("operation already started")]
    AlreadyStarted,

    /// The operation body panicked or was cancelled by runtime shutdown.
    #[error("operation aborted: {0}")]
    Aborted(String),

    /// `start` was called outside a Tokio runtime.
    #[error("no Tokio runtime available to run the operation")]
    NoRuntime,
}

/// Errors from card manager operations.
#[derive(Error, Debug)]
pub enum CardManagerError {
    /// The token provider reported a failure. The directory was not called.
    #[error("access token unavailable: {0}")]
    TokenProvider(#[from] TokenProviderError),

    /// The token provider did not answer in time.
    #[error("access token provider did not answer within {0:?}")]
    TokenTimeout(Duration),

    /// The token provider dropped its completion without calling it.
    #[error("access token provider dropped its completion")]
    TokenCallbackDropped,

    #[error(transparent)]
    Client(#[from] CardClientError),

    /// A returned card is structurally invalid or its id is not its
    /// content hash.
    #[error("card parsing failed: {0}")]
    CardParsingFailed(#[from] CardParseError),

    /// A returned card does not satisfy the trust policy.
    #[error("card {card_id} failed verification: {source}")]
    Verification {
        card_id: CardId,
        source: VerificationError,
    },

    /// A raw card could not be signed before publishing.
    #[error("card signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl CardManagerError {
    /// The trust failure, if this is one.
    pub fn verification_error(&self) -> Option<VerificationError> {
        match self {
            Self::Verification { source, .. } => Some(*source),
            _ => None,
        }
    }
}
