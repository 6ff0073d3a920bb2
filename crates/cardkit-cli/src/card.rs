//! # Card Subcommand
//!
//! Directory operations through the card manager. Every card printed has
//! passed parsing and self plus issuer signature verification.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cardkit_cards::{Card, CardVerifier, RawCard};
use cardkit_client::{CardClient, CardClientConfig};
use cardkit_core::CardId;
use cardkit_crypto::Ed25519PublicKey;
use cardkit_sdk::{CardManager, CardManagerConfig};
use cardkit_token::{AccessToken, ConstAccessTokenProvider};
use clap::{Args, Subcommand};

/// Connection and trust settings shared by every card operation.
#[derive(Args, Debug)]
pub struct DirectoryArgs {
    /// Directory base URL. Falls back to `CARDKIT_SERVICE_URL`, then the
    /// production directory.
    #[arg(long)]
    pub service_url: Option<String>,

    /// Access token sent with every request.
    #[arg(long, env = "CARDKIT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Signer id the issuer signs cards with.
    #[arg(long, env = "CARDKIT_ISSUER_ID")]
    pub issuer_id: String,

    /// Issuer Ed25519 public key (hex).
    #[arg(long, env = "CARDKIT_ISSUER_PUBLIC_KEY")]
    pub issuer_public_key: String,

    /// HTTP request timeout in seconds. Falls back to
    /// `CARDKIT_TIMEOUT_SECS`, then 30.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CardArgs {
    #[command(flatten)]
    pub directory: DirectoryArgs,

    #[command(subcommand)]
    pub command: CardCommand,
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Fetch one card by id.
    Get {
        /// Card id (64 lowercase hex characters).
        id: CardId,
    },

    /// Print the current cards of an identity.
    Search {
        identity: String,
    },

    /// Publish a signed raw card read from a JSON file.
    Publish {
        #[arg(long)]
        file: PathBuf,
    },
}

pub fn run_card(args: &CardArgs) -> Result<u8> {
    let manager = build_manager(&args.directory)?;
    let runtime = tokio::runtime::Runtime::new().context("cannot start async runtime")?;

    match &args.command {
        CardCommand::Get { id } => {
            let card = runtime.block_on(manager.get_card(id.clone()).run())?;
            print_cards(std::slice::from_ref(&card))?;
        }
        CardCommand::Search { identity } => {
            let cards = runtime.block_on(manager.search_cards(identity).run())?;
            if cards.is_empty() {
                tracing::warn!(%identity, "no cards found");
                return Ok(1);
            }
            print_cards(&cards)?;
        }
        CardCommand::Publish { file } => {
            let raw = read_raw_card(file)?;
            let card = runtime.block_on(manager.publish_card(raw).run())?;
            tracing::info!(card_id = %card.id(), "card published");
            print_cards(std::slice::from_ref(&card))?;
        }
    }
    Ok(0)
}

/// Client configuration from the environment, with flags taking precedence.
fn client_config(args: &DirectoryArgs) -> Result<CardClientConfig> {
    let mut config = CardClientConfig::from_env()?;
    if let Some(url) = &args.service_url {
        config.service_url = CardClientConfig::with_url(url)?.service_url;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    Ok(config)
}

fn build_manager(args: &DirectoryArgs) -> Result<CardManager> {
    let config = client_config(args)?;
    let timeout_secs = config.timeout_secs;
    let client = CardClient::new(config)?;

    let token = AccessToken::decode(args.access_token.trim()).context("invalid access token")?;
    if token.is_expired() {
        tracing::warn!("access token is expired; the directory will likely reject it");
    }
    let provider = Arc::new(ConstAccessTokenProvider::new(token));

    let issuer_key =
        Ed25519PublicKey::from_hex(&args.issuer_public_key).context("invalid issuer public key")?;
    let verifier = CardVerifier::ed25519_self_and_issuer(args.issuer_id.clone(), &issuer_key);

    let config = CardManagerConfig {
        token_timeout: Duration::from_secs(timeout_secs),
    };
    Ok(CardManager::new(client, provider, verifier, config))
}

fn read_raw_card(path: &PathBuf) -> Result<RawCard> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a raw card", path.display()))
}

fn print_cards(cards: &[Card]) -> Result<()> {
    for card in cards {
        println!("{}", serde_json::to_string_pretty(&card.to_raw())?);
    }
    Ok(())
}
