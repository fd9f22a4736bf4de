//! Core domain types for the Gatehouse session service.
//!
//! This crate is pure computation, no I/O:
//! - Token codec: signing and verifying access/refresh tokens
//! - Credential verifier: one-way secret hashing and comparison
//! - Configuration types shared across crates
//! - The core error taxonomy

pub mod config;
pub mod credential;
pub mod error;
pub mod token;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use token::{AccessClaims, RefreshClaims, TokenCodec, TokenKind, TokenPair};
