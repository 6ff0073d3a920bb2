//! # cardkit-token: Access Tokens
//!
//! Every directory call is authenticated with a short-lived, signed,
//! self-describing access token. This crate owns:
//!
//! - **Codec** ([`AccessToken`]): `base64url(header) "." base64url(body)
//!   ["." base64url(signature)]`, decode/encode, and the signature-free
//!   snapshot that signers sign and verifiers check.
//! - **Expiry**: a token is expired at or after `exp`, never only after it.
//! - **Issuance** ([`TokenGenerator`]) and **verification**
//!   ([`TokenVerifier`]) with Ed25519.
//! - **Providers** ([`AccessTokenProvider`]): the callback-based interface
//!   the card manager acquires tokens through, plus stock implementations.

pub mod error;
pub mod generator;
pub mod provider;
pub mod token;

pub use error::{TokenError, TokenProviderError};
pub use generator::{TokenGenerator, TokenVerifier};
pub use provider::{
    AccessTokenProvider, CachingAccessTokenProvider, CallbackAccessTokenProvider,
    ConstAccessTokenProvider, TokenCompletion, TokenContext, TokenOperation,
};
pub use token::{AccessToken, TokenBody, TokenHeader, TokenSnapshot};
