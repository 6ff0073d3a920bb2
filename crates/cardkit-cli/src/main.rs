//! # cardkit CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cardkit_cli::card::{run_card, CardArgs};
use cardkit_cli::token::{run_token, TokenArgs};

/// Identity card directory tooling.
///
/// Inspect and issue access tokens; fetch, search and publish cards with
/// every returned card verified against the configured issuer.
#[derive(Parser, Debug)]
#[command(name = "cardkit", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Access token inspection and issuance.
    Token(TokenArgs),

    /// Verified card directory operations.
    Card(CardArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Token(args) => run_token(&args),
        Commands::Card(args) => run_card(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkit_cli::card::CardCommand;
    use cardkit_cli::token::TokenCommand;

    const ID: &str = "5f2c6f0b3c0b6b1f0d8f8e4b2a9c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c";

    fn card_flags() -> Vec<&'static str> {
        vec![
            "--service-url",
            "http://127.0.0.1:8080",
            "--access-token",
            "a.b.c",
            "--issuer-id",
            "issuer",
            "--issuer-public-key",
            "00",
        ]
    }

    #[test]
    fn parses_card_get() {
        let mut argv = vec!["cardkit", "card"];
        argv.extend(card_flags());
        argv.extend(["get", ID]);
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Card(args) => {
                assert_eq!(args.directory.issuer_id, "issuer");
                assert_eq!(args.directory.timeout_secs, None);
                assert!(matches!(args.command, CardCommand::Get { ref id } if id.as_str() == ID));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn card_get_rejects_malformed_id() {
        let mut argv = vec!["cardkit", "card"];
        argv.extend(card_flags());
        argv.extend(["get", "not-an-id"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn parses_card_publish_with_verbosity() {
        let mut argv = vec!["cardkit", "-vv", "card"];
        argv.extend(card_flags());
        argv.extend(["publish", "--file", "alice.json"]);
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Card(CardArgs { command: CardCommand::Publish { .. }, .. })
        ));
    }

    #[test]
    fn parses_token_generate_data() {
        let cli = Cli::try_parse_from([
            "cardkit",
            "token",
            "generate",
            "--identity",
            "alice",
            "--signing-key",
            "00",
            "--data",
            "role=admin",
        ])
        .unwrap();
        match cli.command {
            Commands::Token(TokenArgs {
                command: TokenCommand::Generate { identity, data, ttl_secs, .. },
            }) => {
                assert_eq!(identity, "alice");
                assert_eq!(ttl_secs, 300);
                assert_eq!(data, vec![("role".to_string(), "admin".to_string())]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["cardkit", "frobnicate"]).is_err());
    }
}
