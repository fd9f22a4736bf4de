//! HTTP request handlers.

pub mod health;
pub mod profile;
pub mod sessions;
