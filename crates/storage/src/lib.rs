//! Persistence for the listing-stats system.
//!
//! This crate provides:
//! - SQLite schema for past searches and their top prices
//! - Storing a summary as one search row plus its price rows
//! - Reading search history back

pub mod sqlite;

pub use sqlite::{SearchStore, StoredSearch};
