//! # cardkit-sdk: Card Manager
//!
//! [`CardManager`] composes the pieces of the workspace into three unit
//! operations: get, publish and search. Each one, once started:
//!
//! 1. acquires a fresh access token from the application's
//!    [`AccessTokenProvider`](cardkit_token::AccessTokenProvider), bounded by
//!    a timeout;
//! 2. calls the directory;
//! 3. parses every returned card;
//! 4. verifies every card against the configured trust policy, aborting on
//!    the first failure;
//! 5. for search only, resolves supersession chains and returns heads.
//!
//! Operations are [`CallbackOperation`]s: single-shot units of work that
//! report exactly one result.

pub mod error;
pub mod manager;
pub mod operation;
pub(crate) mod token;

pub use error::{CardManagerError, OperationError};
pub use manager::{CardManager, CardManagerConfig};
pub use operation::CallbackOperation;
