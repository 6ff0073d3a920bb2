//! # Token Error Types

use thiserror::Error;

/// Errors from decoding, encoding, signing or verifying an access token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token string has fewer than two segments, or a segment is not
    /// base64url of the expected shape.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Header or body could not be serialized.
    #[error("corrupt token: {0}")]
    Corrupt(String),

    /// A signature was attached to a token that already carries one.
    #[error("token is already signed")]
    AlreadySigned,

    /// The token carries no signature.
    #[error("token is not signed")]
    Unsigned,

    /// The header names an algorithm this verifier does not accept.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not verify over the token snapshot.
    #[error("token signature is invalid")]
    InvalidSignature,
}

/// Errors reported by an [`AccessTokenProvider`](crate::AccessTokenProvider).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenProviderError {
    /// The provider could not produce a token.
    #[error("token provider failed: {0}")]
    Failed(String),

    /// The provider produced a string that is not a valid token.
    #[error(transparent)]
    Token(#[from] TokenError),
}
