//! Marketplace access for the listing-stats system.
//!
//! This crate handles:
//! - Item summary search requests over HTTP
//! - OAuth token caching on disk

pub mod client;
pub mod token;

pub use client::BrowseClient;
pub use token::{default_token_path, TokenCache};
