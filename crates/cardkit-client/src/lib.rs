//! # cardkit-client: Card Directory Client
//!
//! Typed access to the card directory:
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/cards/{cardId}` | [`CardClient::get_card`] |
//! | POST   | `/cards` | [`CardClient::publish_card`] |
//! | GET    | `/cards/actions/search?identity=` | [`CardClient::search_cards`] |
//!
//! Every request carries `Identity-Authorization: <token>`. Every response
//! goes through one validate → parse → deserialize pipeline so the three
//! operations report errors identically. Nothing is retried here.

pub mod client;
pub mod config;
pub mod error;

pub use client::{CardClient, AUTHORIZATION_HEADER};
pub use config::{CardClientConfig, ConfigError, DEFAULT_SERVICE_URL};
pub use error::{CardClientError, ServiceError};
