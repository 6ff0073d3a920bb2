//! # Card Manager
//!
//! Every operation follows the same template ([`Inner::orchestrate`]):
//! token, directory call, parse, verify. Search then resolves chains; get
//! and publish return their single card as is.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cardkit_cards::{Card, CardVerifier, ChainResolver, ModelSigner, RawCard};
use cardkit_client::{CardClient, CardClientError};
use cardkit_core::CardId;
use cardkit_crypto::Ed25519KeyPair;
use cardkit_token::{AccessToken, AccessTokenProvider, TokenContext, TokenOperation};

use crate::error::CardManagerError;
use crate::operation::CallbackOperation;
use crate::token::acquire_token;

/// Card manager settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardManagerConfig {
    /// How long to wait for the token provider's completion.
    pub token_timeout: Duration,
}

impl Default for CardManagerConfig {
    fn default() -> Self {
        Self {
            token_timeout: Duration::from_secs(30),
        }
    }
}

/// Verified access to the card directory.
///
/// Cheap to clone; clones share the client, provider and policy.
#[derive(Clone)]
pub struct CardManager {
    inner: Arc<Inner>,
}

struct Inner {
    client: CardClient,
    provider: Arc<dyn AccessTokenProvider>,
    verifier: CardVerifier,
    config: CardManagerConfig,
}

/// Directory responses the template knows how to accept.
trait DirectoryResponse {
    type Accepted;

    fn accept_with<F>(self, accept: F) -> Result<Self::Accepted, CardManagerError>
    where
        F: FnMut(RawCard) -> Result<Card, CardManagerError>;
}

impl DirectoryResponse for RawCard {
    type Accepted = Card;

    fn accept_with<F>(self, mut accept: F) -> Result<Card, CardManagerError>
    where
        F: FnMut(RawCard) -> Result<Card, CardManagerError>,
    {
        accept(self)
    }
}

impl DirectoryResponse for Vec<RawCard> {
    type Accepted = Vec<Card>;

    fn accept_with<F>(self, accept: F) -> Result<Vec<Card>, CardManagerError>
    where
        F: FnMut(RawCard) -> Result<Card, CardManagerError>,
    {
        self.into_iter().map(accept).collect()
    }
}

impl CardManager {
    pub fn new(
        client: CardClient,
        provider: Arc<dyn AccessTokenProvider>,
        verifier: CardVerifier,
        config: CardManagerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                provider,
                verifier,
                config,
            }),
        }
    }

    /// Fetch and verify one card.
    pub fn get_card(&self, id: CardId) -> CallbackOperation<Card, CardManagerError> {
        let inner = Arc::clone(&self.inner);
        CallbackOperation::new(async move {
            let context = TokenContext::new(TokenOperation::Get);
            inner
                .orchestrate(context, move |client, token| async move {
                    client.get_card(&id, &token).await
                })
                .await
        })
    }

    /// Publish a signed raw card and verify what the directory returns.
    pub fn publish_card(&self, raw: RawCard) -> CallbackOperation<Card, CardManagerError> {
        let inner = Arc::clone(&self.inner);
        CallbackOperation::new(async move {
            let context = TokenContext::new(TokenOperation::Publish).with_identity(&raw.identity);
            inner
                .orchestrate(context, move |client, token| async move {
                    client.publish_card(&raw, &token).await
                })
                .await
        })
    }

    /// Build a card for `key`, self-sign it and publish it.
    ///
    /// Signing happens immediately; only the network part is deferred.
    pub fn publish_card_with_key(
        &self,
        key: &Ed25519KeyPair,
        identity: &str,
        previous_card_id: Option<&CardId>,
        extra_fields: BTreeMap<String, String>,
    ) -> Result<CallbackOperation<Card, CardManagerError>, CardManagerError> {
        let mut raw = RawCard::new(identity, key.public_key().as_bytes().to_vec(), previous_card_id);
        ModelSigner::self_sign(&mut raw, key, extra_fields)?;
        Ok(self.publish_card(raw))
    }

    /// Current cards for `identity`: every chain head among the verified
    /// search results.
    pub fn search_cards(&self, identity: &str) -> CallbackOperation<Vec<Card>, CardManagerError> {
        let inner = Arc::clone(&self.inner);
        let identity = identity.to_string();
        CallbackOperation::new(async move {
            let context = TokenContext::new(TokenOperation::Search).with_identity(&identity);
            let cards = inner
                .orchestrate(context, move |client, token| async move {
                    client.search_cards(&identity, &token).await
                })
                .await?;
            let batch = ChainResolver::resolve(cards);
            tracing::debug!(cards = batch.len(), "resolved search batch");
            Ok(batch.into_heads())
        })
    }
}

impl Inner {
    async fn orchestrate<R, F, Fut>(
        &self,
        context: TokenContext,
        call: F,
    ) -> Result<R::Accepted, CardManagerError>
    where
        R: DirectoryResponse,
        F: FnOnce(CardClient, AccessToken) -> Fut,
        Fut: Future<Output = Result<R, CardClientError>>,
    {
        let operation = context.operation;
        let token = acquire_token(&self.provider, context, self.config.token_timeout).await?;
        tracing::debug!(%operation, "calling directory");
        let response = call(self.client.clone(), token).await?;
        response.accept_with(|raw| self.accept(raw))
    }

    fn accept(&self, raw: RawCard) -> Result<Card, CardManagerError> {
        let card = Card::parse(raw).map_err(|e| {
            tracing::warn!(error = %e, "rejecting unparseable card");
            CardManagerError::CardParsingFailed(e)
        })?;
        self.verifier.verify(&card).map_err(|source| {
            tracing::warn!(card_id = %card.id(), error = %source, "rejecting unverified card");
            CardManagerError::Verification {
                card_id: card.id().clone(),
                source,
            }
        })?;
        Ok(card)
    }
}

impl std::fmt::Debug for CardManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardManager")
            .field("client", &self.inner.client)
            .field("verifier", &self.inner.verifier)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
