//! Data ingestion and normalization for the listing-stats system.
//!
//! This crate handles:
//! - Decoding item summary search responses into raw listings
//! - Price and auction end-time parsing
//! - Listing classification (fixed price / auction / skipped)

pub mod classifier;
pub mod payload;

pub use classifier::{
    parse_end_time, parse_price, ClassificationStats, ListingClassifier, SkipReason,
    END_TIME_FORMAT,
};
pub use payload::{decode_search_response, decode_search_str, SearchPage};
