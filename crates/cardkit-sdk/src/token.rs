//! Bridge from the callback-based token provider to async code.
//!
//! The provider is called on the blocking pool so a provider that blocks
//! its calling thread cannot stall the runtime, and the wait for its
//! completion is bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use cardkit_token::{AccessToken, AccessTokenProvider, TokenContext};
use tokio::sync::oneshot;

use crate::error::CardManagerError;

pub(crate) async fn acquire_token(
    provider: &Arc<dyn AccessTokenProvider>,
    context: TokenContext,
    timeout: Duration,
) -> Result<AccessToken, CardManagerError> {
    let (tx, rx) = oneshot::channel();
    let provider = Arc::clone(provider);
    let operation = context.operation;
    tokio::task::spawn_blocking(move || {
        provider.get_token(
            context,
            Box::new(move |result| {
                // The receiver is gone only if the wait already timed out.
                let _ = tx.send(result);
            }),
        );
    });

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(Ok(token))) => Ok(token),
        Ok(Ok(Err(e))) => {
            tracing::warn!(%operation, error = %e, "access token provider failed");
            Err(CardManagerError::TokenProvider(e))
        }
        Ok(Err(_)) => {
            tracing::warn!(%operation, "access token provider dropped its completion");
            Err(CardManagerError::TokenCallbackDropped)
        }
        Err(_) => {
            tracing::warn!(%operation, ?timeout, "access token provider timed out");
            Err(CardManagerError::TokenTimeout(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkit_token::{
        CallbackAccessTokenProvider, TokenBody, TokenHeader, TokenOperation, TokenProviderError,
    };
    use std::collections::BTreeMap;

    fn token() -> AccessToken {
        AccessToken::new(
            TokenHeader {
                alg: "EdDSA".into(),
                typ: "JWT".into(),
                cty: None,
                kid: None,
            },
            TokenBody {
                identity: "alice".into(),
                iat: 0,
                exp: i64::MAX,
                sub: "identity-alice".into(),
                data: BTreeMap::new(),
            },
        )
        .unwrap()
    }

    fn provider<F>(f: F) -> Arc<dyn AccessTokenProvider>
    where
        F: Fn(TokenContext, cardkit_token::TokenCompletion) + Send + Sync + 'static,
    {
        Arc::new(CallbackAccessTokenProvider::new(f))
    }

    fn ctx() -> TokenContext {
        TokenContext::new(TokenOperation::Get)
    }

    #[tokio::test]
    async fn returns_token_from_completion() {
        let p = provider(|_, done| done(Ok(token())));
        let got = acquire_token(&p, ctx(), Duration::from_secs(1)).await.unwrap();
        assert_eq!(got, token());
    }

    #[tokio::test]
    async fn completion_from_another_thread_is_awaited() {
        let p = provider(|_, done| {
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                done(Ok(token()));
            });
        });
        assert!(acquire_token(&p, ctx(), Duration::from_secs(5)).await.is_ok());
    }

    #[tokio::test]
    async fn provider_error_is_propagated() {
        let p = provider(|_, done| done(Err(TokenProviderError::Failed("denied".into()))));
        let err = acquire_token(&p, ctx(), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(
            err,
            CardManagerError::TokenProvider(TokenProviderError::Failed(ref m)) if m == "denied"
        ));
    }

    #[tokio::test]
    async fn dropped_completion_is_reported() {
        let p = provider(|_, done| drop(done));
        let err = acquire_token(&p, ctx(), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, CardManagerError::TokenCallbackDropped));
    }

    #[tokio::test]
    async fn silent_provider_times_out() {
        let p = provider(|_, done| std::mem::forget(done));
        let err = acquire_token(&p, ctx(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CardManagerError::TokenTimeout(d) if d == Duration::from_millis(50)));
    }
}
