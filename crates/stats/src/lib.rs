//! Price statistics for the listing-stats system.
//!
//! This crate handles:
//! - Listing aggregation into a statistical summary
//! - Price distribution histogram
//! - Text report rendering

pub mod aggregator;
pub mod histogram;
pub mod report;

pub use aggregator::{summarize, ListingAggregator};
pub use histogram::{HistogramBin, PriceHistogram};
pub use report::{format_time_remaining, Report};
