//! Human-readable search report.

use crate::histogram::PriceHistogram;
use chrono::{DateTime, Utc};
use listing_core::config::ReportConfig;
use listing_core::StatsSummary;
use std::fmt;

/// Format the time left until `end`, e.g. `3h 5m` or `42m`. Past end times
/// give `None`.
pub fn format_time_remaining(end: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    let secs = (end - now).num_seconds();
    if secs <= 0 {
        return None;
    }
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    Some(if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    })
}

/// Text report for one search. Render with `to_string()` or `{}`.
pub struct Report<'a> {
    search_term: &'a str,
    summary: &'a StatsSummary,
    now: DateTime<Utc>,
    histogram_bins: usize,
    bar_width: usize,
}

impl<'a> Report<'a> {
    /// Create a report. `now` is the reference for auction time remaining.
    pub fn new(search_term: &'a str, summary: &'a StatsSummary, now: DateTime<Utc>) -> Self {
        let defaults = ReportConfig::default();
        Self {
            search_term,
            summary,
            now,
            histogram_bins: defaults.histogram_bins,
            bar_width: defaults.bar_width,
        }
    }

    /// Apply histogram settings from configuration.
    pub fn with_config(mut self, config: &ReportConfig) -> Self {
        self.histogram_bins = config.histogram_bins;
        self.bar_width = config.bar_width;
        self
    }

    fn write_fixed_prices(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prices = &self.summary.top_fixed_price;
        if prices.is_empty() {
            return writeln!(f, "No Buy It Now listings found");
        }
        writeln!(f, "Lowest {} Buy It Now Prices:", prices.len())?;
        for price in prices {
            writeln!(f, "  ${:.2}", price)?;
        }
        Ok(())
    }

    fn write_auctions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;
        if summary.top_auction.is_empty() {
            return writeln!(f, "No auction listings found");
        }
        writeln!(f, "{} Ending Soonest Auctions:", summary.top_auction.len())?;
        for (price, end) in summary.top_auction.iter().zip(&summary.top_auction_end_times) {
            match format_time_remaining(end.at, self.now) {
                Some(left) => writeln!(f, "  ${:.2} (Ends in {})", price, left)?,
                None => writeln!(f, "  ${:.2} (Ended)", price)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;
        writeln!(f, "Results for '{}':", self.search_term)?;
        writeln!(f)?;
        writeln!(f, "Total Listings: {}", summary.total_listings)?;
        writeln!(f, "Average Price: ${:.2}", summary.avg_price)?;
        writeln!(f, "Minimum Price: ${:.2}", summary.min_price)?;
        writeln!(f, "Maximum Price: ${:.2}", summary.max_price)?;
        writeln!(f)?;
        self.write_fixed_prices(f)?;
        writeln!(f)?;
        self.write_auctions(f)?;

        let histogram = PriceHistogram::from_prices(&summary.all_prices, self.histogram_bins);
        writeln!(f)?;
        if histogram.is_empty() {
            writeln!(f, "No price data available for chart")
        } else {
            writeln!(f, "Price Distribution (All Listings):")?;
            write!(f, "{}", histogram.render(self.bar_width))
        }
    }
}
