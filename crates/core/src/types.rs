//! Core data types for the listing-stats system.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Price type with ordering support.
pub type Price = OrderedFloat<f64>;

/// Buying-option tag marking a "buy it now" listing.
pub const FIXED_PRICE_TAG: &str = "FIXED_PRICE";

/// Buying-option tag marking an auction listing.
pub const AUCTION_TAG: &str = "AUCTION";

/// Default length of the top-N lists in a summary.
pub const DEFAULT_TOP_N: usize = 5;

/// Price field exactly as it arrived in the source payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawPrice {
    /// Field absent from the record.
    Missing,
    /// Numeric value.
    Number(f64),
    /// String value, possibly non-numeric (e.g. "N/A").
    Text(String),
    /// Present but of a type that cannot hold a price.
    Malformed,
}

impl From<f64> for RawPrice {
    fn from(value: f64) -> Self {
        RawPrice::Number(value)
    }
}

impl From<&str> for RawPrice {
    fn from(value: &str) -> Self {
        RawPrice::Text(value.to_string())
    }
}

/// Buying option derived from a listing's tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyingOption {
    /// Purchasable immediately at the stated price.
    FixedPrice,
    /// Bidding closes at a scheduled end time.
    Auction,
    /// Neither recognised tag is present.
    Other,
}

impl BuyingOption {
    /// Map a single tag to a buying option.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            FIXED_PRICE_TAG => BuyingOption::FixedPrice,
            AUCTION_TAG => BuyingOption::Auction,
            _ => BuyingOption::Other,
        }
    }

    /// Resolve a tag set. Fixed price wins whenever present, regardless of
    /// tag order.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut option = BuyingOption::Other;
        for tag in tags {
            match BuyingOption::from_tag(tag.as_ref()) {
                BuyingOption::FixedPrice => return BuyingOption::FixedPrice,
                BuyingOption::Auction => option = BuyingOption::Auction,
                BuyingOption::Other => {}
            }
        }
        option
    }
}

/// One marketplace item as delivered by the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    /// Marketplace item identifier, if the source supplied one.
    pub item_id: Option<String>,
    /// Item title, if the source supplied one.
    pub title: Option<String>,
    /// Raw price field.
    pub price: RawPrice,
    /// Buying-option tags (e.g. `FIXED_PRICE`, `AUCTION`, `BEST_OFFER`).
    pub buying_options: Vec<String>,
    /// Auction end timestamp string, present only for auctions.
    pub item_end_date: Option<String>,
}

impl RawListing {
    /// Create a listing with the given price and tags.
    pub fn new<S: Into<String>>(
        price: impl Into<RawPrice>,
        buying_options: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            item_id: None,
            title: None,
            price: price.into(),
            buying_options: buying_options.into_iter().map(Into::into).collect(),
            item_end_date: None,
        }
    }

    /// Create a fixed-price listing.
    pub fn fixed_price(price: impl Into<RawPrice>) -> Self {
        Self::new(price, [FIXED_PRICE_TAG])
    }

    /// Create an auction listing ending at `end_date`.
    pub fn auction(price: impl Into<RawPrice>, end_date: impl Into<String>) -> Self {
        Self::new(price, [AUCTION_TAG]).with_end_date(end_date)
    }

    /// Set the auction end timestamp string.
    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.item_end_date = Some(end_date.into());
        self
    }

    /// Resolve the buying option from the tag set.
    pub fn buying_option(&self) -> BuyingOption {
        BuyingOption::from_tags(&self.buying_options)
    }
}

/// Kind of a listing that survived classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingKind {
    FixedPrice,
    Auction,
}

impl ListingKind {
    /// Is this an auction?
    #[inline]
    pub fn is_auction(self) -> bool {
        self == ListingKind::Auction
    }
}

/// Auction end time, kept in both its original and parsed forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionEnd {
    /// Timestamp string as received.
    pub raw: String,
    /// Parsed instant.
    pub at: DateTime<Utc>,
}

/// A listing with a parsed price and a resolved kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedListing {
    /// Parsed price.
    pub price: f64,
    /// Fixed price or auction.
    pub kind: ListingKind,
    /// End time, always present for auctions and absent otherwise.
    pub end_time: Option<AuctionEnd>,
}

impl ClassifiedListing {
    /// Create a fixed-price listing.
    pub fn fixed_price(price: f64) -> Self {
        Self {
            price,
            kind: ListingKind::FixedPrice,
            end_time: None,
        }
    }

    /// Create an auction listing.
    pub fn auction(price: f64, end_time: AuctionEnd) -> Self {
        Self {
            price,
            kind: ListingKind::Auction,
            end_time: Some(end_time),
        }
    }
}

/// Statistical summary of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Source-reported total; may exceed the number of records examined.
    pub total_listings: u64,
    /// Arithmetic mean of `all_prices`.
    pub avg_price: f64,
    /// Minimum of `all_prices`.
    pub min_price: f64,
    /// Maximum of `all_prices`.
    pub max_price: f64,
    /// Fixed-price pool followed by auction pool, input order within each.
    pub all_prices: Vec<f64>,
    /// Lowest fixed prices, ascending.
    pub top_fixed_price: Vec<f64>,
    /// Prices of the soonest-ending auctions, in end-time order.
    pub top_auction: Vec<f64>,
    /// End times parallel to `top_auction`.
    pub top_auction_end_times: Vec<AuctionEnd>,
}

impl StatsSummary {
    /// Number of listings that contributed a price.
    pub fn survivor_count(&self) -> usize {
        self.all_prices.len()
    }

    /// Build the persisted search record.
    pub fn search_record(&self, search_term: impl Into<String>, timestamp: DateTime<Utc>) -> SearchRecord {
        SearchRecord {
            search_term: search_term.into(),
            timestamp,
            total_listings: self.total_listings,
            avg_price: self.avg_price,
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }

    /// Price detail records: the top fixed prices followed by the top auctions.
    pub fn price_records(&self) -> Vec<PriceRecord> {
        let fixed = self.top_fixed_price.iter().map(|&price| PriceRecord {
            price,
            is_auction: false,
        });
        let auction = self.top_auction.iter().map(|&price| PriceRecord {
            price,
            is_auction: true,
        });
        fixed.chain(auction).collect()
    }
}

/// Persisted header row for one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub search_term: String,
    pub timestamp: DateTime<Utc>,
    pub total_listings: u64,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// Persisted price detail row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub price: f64,
    pub is_auction: bool,
}
