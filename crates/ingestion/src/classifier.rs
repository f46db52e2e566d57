//! Listing classification.
//!
//! Parses the price and, for auctions, the end time of each raw listing and
//! resolves it to a fixed-price or auction listing. Listings that cannot be
//! resolved are skipped; the reason is recorded in [`ClassificationStats`]
//! and never surfaced as an error.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use listing_core::{AuctionEnd, BuyingOption, ClassifiedListing, RawListing, RawPrice};

/// Auction end-time format (`YYYY-MM-DDTHH:MM:SS.ffffffZ`).
pub const END_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Longest fractional-second part accepted in an end time.
const MAX_FRACTION_DIGITS: usize = 6;

/// Parse a raw price field.
///
/// An absent field counts as `0.0`. Anything that is not a finite,
/// non-negative number (after trimming, for strings) yields `None`.
pub fn parse_price(raw: &RawPrice) -> Option<f64> {
    let value = match raw {
        RawPrice::Missing => 0.0,
        RawPrice::Number(v) => *v,
        RawPrice::Text(s) => s.trim().parse::<f64>().ok()?,
        RawPrice::Malformed => return None,
    };

    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Layout of the `YYYY-MM-DDTHH:MM:SS` part; `d` marks a digit.
const DATE_TIME_LAYOUT: &[u8; 19] = b"dddd-dd-ddTdd:dd:dd";

/// Parse an auction end time in [`END_TIME_FORMAT`].
///
/// Every field has a fixed width (four-digit year, no sign, no padding). The
/// fractional seconds are mandatory and limited to 1-6 digits. Leap seconds
/// are rejected.
pub fn parse_end_time(raw: &str) -> Option<DateTime<Utc>> {
    let (head, fraction) = raw.strip_suffix('Z')?.rsplit_once('.')?;
    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    if head.len() != DATE_TIME_LAYOUT.len()
        || !head
            .bytes()
            .zip(DATE_TIME_LAYOUT.iter())
            .all(|(b, &l)| if l == b'd' { b.is_ascii_digit() } else { b == l })
    {
        return None;
    }

    let dt = NaiveDateTime::parse_from_str(raw, END_TIME_FORMAT).ok()?;
    if dt.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(dt.and_utc())
}

/// Why a listing was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Price field could not be coerced to a number.
    InvalidPrice,
    /// Auction without an end time (absent or empty).
    MissingEndTime,
    /// Auction whose end time did not parse.
    InvalidEndTime,
    /// Neither fixed-price nor auction tag present.
    UnknownBuyingOption,
}

/// Statistics about classification outcomes.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    /// Total listings examined.
    pub total_listings: u64,
    /// Listings classified as fixed price.
    pub fixed_price: u64,
    /// Listings classified as auction.
    pub auction: u64,
    /// Skipped: unparseable price.
    pub invalid_price: u64,
    /// Skipped: auction without end time.
    pub missing_end_time: u64,
    /// Skipped: auction with malformed end time.
    pub invalid_end_time: u64,
    /// Skipped: no recognised buying option.
    pub unknown_buying_option: u64,
}

impl ClassificationStats {
    /// Listings that survived classification.
    pub fn survivors(&self) -> u64 {
        self.fixed_price + self.auction
    }

    /// Listings that were dropped.
    pub fn skipped(&self) -> u64 {
        self.total_listings - self.survivors()
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn record(&mut self, outcome: &Result<ClassifiedListing, SkipReason>) {
        self.total_listings += 1;
        match outcome {
            Ok(listing) if listing.kind.is_auction() => self.auction += 1,
            Ok(_) => self.fixed_price += 1,
            Err(SkipReason::InvalidPrice) => self.invalid_price += 1,
            Err(SkipReason::MissingEndTime) => self.missing_end_time += 1,
            Err(SkipReason::InvalidEndTime) => self.invalid_end_time += 1,
            Err(SkipReason::UnknownBuyingOption) => self.unknown_buying_option += 1,
        }
    }
}

/// Classifier that resolves raw listings and tracks outcome counts.
#[derive(Debug, Default)]
pub struct ListingClassifier {
    stats: ClassificationStats,
}

impl ListingClassifier {
    /// Create a new listing classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a single listing.
    pub fn classify(&mut self, listing: &RawListing) -> Result<ClassifiedListing, SkipReason> {
        let outcome = Self::resolve(listing);
        self.stats.record(&outcome);
        outcome
    }

    fn resolve(listing: &RawListing) -> Result<ClassifiedListing, SkipReason> {
        let price = parse_price(&listing.price).ok_or(SkipReason::InvalidPrice)?;

        match listing.buying_option() {
            BuyingOption::FixedPrice => Ok(ClassifiedListing::fixed_price(price)),
            BuyingOption::Auction => {
                let raw = listing
                    .item_end_date
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or(SkipReason::MissingEndTime)?;
                let at = parse_end_time(raw).ok_or(SkipReason::InvalidEndTime)?;
                Ok(ClassifiedListing::auction(
                    price,
                    AuctionEnd {
                        raw: raw.to_string(),
                        at,
                    },
                ))
            }
            BuyingOption::Other => Err(SkipReason::UnknownBuyingOption),
        }
    }

    /// Classify a batch, keeping survivors in input order.
    pub fn classify_batch(&mut self, listings: &[RawListing]) -> Vec<ClassifiedListing> {
        listings
            .iter()
            .filter_map(|listing| self.classify(listing).ok())
            .collect()
    }

    /// Get classification statistics.
    pub fn stats(&self) -> &ClassificationStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}
