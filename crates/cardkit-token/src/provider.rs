//! # Access Token Providers
//!
//! The card manager never owns credentials. It asks an
//! [`AccessTokenProvider`] for a token before every directory call, and the
//! provider answers through a completion callback, possibly on another
//! thread and possibly after its own network round trip.

use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;

use crate::error::TokenProviderError;
use crate::token::AccessToken;

/// Completion callback handed to [`AccessTokenProvider::get_token`].
pub type TokenCompletion = Box<dyn FnOnce(Result<AccessToken, TokenProviderError>) + Send>;

/// The directory operation a token is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenOperation {
    Get,
    Publish,
    Search,
}

impl TokenOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Publish => "publish",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for TokenOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context passed with every token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContext {
    pub operation: TokenOperation,
    /// Identity the call acts for, when the caller knows it.
    pub identity: Option<String>,
    /// Ask the provider to bypass any cache.
    pub force_reload: bool,
}

impl TokenContext {
    pub fn new(operation: TokenOperation) -> Self {
        Self {
            operation,
            identity: None,
            force_reload: false,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }
}

/// Source of access tokens.
///
/// Implementations must call `completion` exactly once. Dropping it without
/// calling it is reported to the caller as a provider failure.
pub trait AccessTokenProvider: Send + Sync {
    fn get_token(&self, context: TokenContext, completion: TokenCompletion);
}

/// Always returns the same token.
#[derive(Debug, Clone)]
pub struct ConstAccessTokenProvider {
    token: AccessToken,
}

impl ConstAccessTokenProvider {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

impl AccessTokenProvider for ConstAccessTokenProvider {
    fn get_token(&self, _context: TokenContext, completion: TokenCompletion) {
        completion(Ok(self.token.clone()));
    }
}

type TokenCallback = dyn Fn(TokenContext, TokenCompletion) + Send + Sync;

/// Delegates to a closure, typically one that fetches a token from the
/// application backend.
pub struct CallbackAccessTokenProvider {
    callback: Box<TokenCallback>,
}

impl CallbackAccessTokenProvider {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(TokenContext, TokenCompletion) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl AccessTokenProvider for CallbackAccessTokenProvider {
    fn get_token(&self, context: TokenContext, completion: TokenCompletion) {
        (self.callback)(context, completion);
    }
}

impl std::fmt::Debug for CallbackAccessTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CallbackAccessTokenProvider")
    }
}

/// Reuses the last token from an inner provider until it is within
/// `margin` of expiry.
///
/// Only successful results are cached. `force_reload` always goes to the
/// inner provider.
pub struct CachingAccessTokenProvider {
    inner: Arc<dyn AccessTokenProvider>,
    cached: Arc<Mutex<Option<AccessToken>>>,
    margin: Duration,
}

impl CachingAccessTokenProvider {
    pub fn new(inner: Arc<dyn AccessTokenProvider>, margin: Duration) -> Self {
        Self {
            inner,
            cached: Arc::new(Mutex::new(None)),
            margin,
        }
    }

    fn fresh_cached(&self) -> Option<AccessToken> {
        let guard = self.cached.lock();
        guard
            .as_ref()
            .filter(|t| !t.is_expired_at(Utc::now() + self.margin))
            .cloned()
    }
}

impl AccessTokenProvider for CachingAccessTokenProvider {
    fn get_token(&self, context: TokenContext, completion: TokenCompletion) {
        if !context.force_reload {
            if let Some(token) = self.fresh_cached() {
                tracing::debug!(operation = %context.operation, "using cached access token");
                completion(Ok(token));
                return;
            }
        }

        // The lock is not held here: the inner provider may complete
        // synchronously on this thread.
        let cached = Arc::clone(&self.cached);
        self.inner.get_token(
            context,
            Box::new(move |result| {
                match &result {
                    Ok(token) => *cached.lock() = Some(token.clone()),
                    Err(e) => tracing::warn!(error = %e, "access token refresh failed"),
                }
                completion(result);
            }),
        );
    }
}

impl std::fmt::Debug for CachingAccessTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingAccessTokenProvider")
            .field("margin", &self.margin)
            .field("cached", &self.cached.lock().is_some())
            .finish()
    }
}
