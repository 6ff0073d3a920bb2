//! # cardkit-cli: Command-Line Interface for cardkit
//!
//! ## Subcommands
//!
//! - `cardkit token inspect`: decode a token, report expiry, optionally
//!   verify its signature.
//! - `cardkit token generate`: issue a signed token (development issuers).
//! - `cardkit card get|search|publish`: verified directory operations.
//!
//! ```bash
//! cardkit token inspect "$CARDKIT_ACCESS_TOKEN"
//! cardkit card search alice
//! cardkit card publish --file alice.card.json
//! ```

pub mod card;
pub mod token;
