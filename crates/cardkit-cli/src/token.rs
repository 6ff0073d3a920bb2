//! # Token Subcommand
//!
//! Offline token tooling: nothing here talks to the directory.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use cardkit_crypto::{Ed25519KeyPair, Ed25519PublicKey};
use cardkit_token::{AccessToken, TokenGenerator, TokenVerifier};
use chrono::Utc;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Decode a token and print its header, body and expiry status.
    Inspect {
        /// The token string.
        #[arg(env = "CARDKIT_ACCESS_TOKEN")]
        token: String,

        /// Verify the signature with this issuer public key (hex).
        #[arg(long)]
        issuer_public_key: Option<String>,
    },

    /// Issue a signed token.
    Generate {
        /// Identity the token is issued for.
        #[arg(long)]
        identity: String,

        /// Issuer Ed25519 private key seed (hex).
        #[arg(long, env = "CARDKIT_TOKEN_SIGNING_KEY", hide_env_values = true)]
        signing_key: String,

        /// Key identifier placed in the token header.
        #[arg(long)]
        key_id: Option<String>,

        /// Lifetime in seconds.
        #[arg(long, default_value_t = 300)]
        ttl_secs: i64,

        /// Application data entries, as KEY=VALUE.
        #[arg(long = "data", value_parser = parse_key_value)]
        data: Vec<(String, String)>,
    },
}

pub fn run_token(args: &TokenArgs) -> Result<u8> {
    match &args.command {
        TokenCommand::Inspect {
            token,
            issuer_public_key,
        } => inspect(token, issuer_public_key.as_deref()),
        TokenCommand::Generate {
            identity,
            signing_key,
            key_id,
            ttl_secs,
            data,
        } => {
            let key = Ed25519KeyPair::from_seed_hex(signing_key).context("invalid signing key")?;
            let ttl = chrono::Duration::try_seconds(*ttl_secs)
                .with_context(|| format!("ttl of {ttl_secs} seconds is out of range"))?;
            let generator = TokenGenerator::new(key, key_id.clone(), ttl);
            let data: BTreeMap<String, String> = data.iter().cloned().collect();
            let token = generator.generate_token(identity, data)?;
            println!("{}", token.encode());
            Ok(0)
        }
    }
}

fn inspect(token: &str, issuer_public_key: Option<&str>) -> Result<u8> {
    let token = AccessToken::decode(token.trim()).context("cannot decode token")?;
    let expired = token.is_expired_at(Utc::now());

    let report = serde_json::json!({
        "header": token.header(),
        "body": token.body(),
        "signed": token.signature().is_some(),
        "expires_at": token.expires_at().map(|t| t.to_rfc3339()),
        "expired": expired,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    let mut code = if expired { 1 } else { 0 };
    if let Some(hex) = issuer_public_key {
        let key = Ed25519PublicKey::from_hex(hex).context("invalid issuer public key")?;
        match TokenVerifier::ed25519(&key).verify(&token) {
            Ok(()) => tracing::info!("token signature verified"),
            Err(e) => {
                tracing::error!("token signature check failed: {e}");
                code = 2;
            }
        }
    }
    Ok(code)
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
}
