//! # cardkit-core: Foundational Types for cardkit
//!
//! Every other crate in the workspace depends on `cardkit-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Everything that is hashed or signed
//!    (card content, signature envelopes) flows through
//!    `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for digests.
//!
//! 2. **Content-derived card identifiers.** A [`CardId`] is the lowercase hex
//!    SHA-256 of a card's canonical content. The client never assigns one;
//!    it only recomputes and compares.
//!
//! 3. **`sha256_hex()` accepts only `&CanonicalBytes`.** Every identifier is
//!    computed from canonical input.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cardkit-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::sha256_hex;
pub use error::{CanonicalizationError, ValidationError};
pub use identity::CardId;
