//! Core types and configuration for the listing-stats system.
//!
//! This crate provides shared types used across all other crates:
//! - Raw and classified listing types
//! - The statistical summary and its persisted decomposition
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{EmptyResult, Error, Result};
pub use types::*;
