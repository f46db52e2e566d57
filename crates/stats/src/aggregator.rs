//! Listing aggregation.
//!
//! Reduces a page of raw listings to a [`StatsSummary`]: price statistics over
//! every surviving listing, the cheapest fixed-price listings and the
//! soonest-ending auctions. Listings that fail classification are dropped
//! silently; only the case where nothing survives is reported, as
//! [`EmptyResult`].

use listing_core::config::AggregationConfig;
use listing_core::{
    AuctionEnd, ClassifiedListing, EmptyResult, ListingKind, Price, RawListing, StatsSummary,
    DEFAULT_TOP_N,
};
use listing_ingestion::ListingClassifier;
use statrs::statistics::Statistics;
use tracing::debug;

/// An auction waiting to be ranked by end time.
#[derive(Debug, Clone)]
struct PendingAuction {
    price: f64,
    end: AuctionEnd,
}

/// Listing aggregator.
#[derive(Debug, Clone)]
pub struct ListingAggregator {
    /// Length of each top-N list.
    top_n: usize,
}

impl Default for ListingAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl ListingAggregator {
    /// Create a new aggregator keeping `top_n` entries per ranked list.
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Create an aggregator from configuration.
    pub fn from_config(config: &AggregationConfig) -> Self {
        Self::new(config.top_n)
    }

    /// Length of each top-N list.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Summarize a page of listings.
    ///
    /// `reported_total` is copied into the summary as-is; it is the source's
    /// match count, not the number of listings examined here.
    pub fn summarize(
        &self,
        listings: &[RawListing],
        reported_total: u64,
    ) -> Result<StatsSummary, EmptyResult> {
        let mut classifier = ListingClassifier::new();
        let mut fixed_prices = Vec::new();
        let mut auctions = Vec::new();

        for listing in listings {
            match classifier.classify(listing) {
                Ok(ClassifiedListing {
                    price,
                    kind: ListingKind::FixedPrice,
                    ..
                }) => fixed_prices.push(price),
                Ok(ClassifiedListing {
                    price,
                    kind: ListingKind::Auction,
                    end_time: Some(end),
                }) => auctions.push(PendingAuction { price, end }),
                _ => {}
            }
        }

        let stats = classifier.stats();
        debug!(
            examined = stats.total_listings,
            fixed_price = stats.fixed_price,
            auction = stats.auction,
            invalid_price = stats.invalid_price,
            missing_end_time = stats.missing_end_time,
            invalid_end_time = stats.invalid_end_time,
            unknown_buying_option = stats.unknown_buying_option,
            "classified listings"
        );

        if fixed_prices.is_empty() && auctions.is_empty() {
            return Err(EmptyResult);
        }

        // Pool order: fixed prices first, then auctions, both in input order.
        let all_prices: Vec<f64> = fixed_prices
            .iter()
            .copied()
            .chain(auctions.iter().map(|a| a.price))
            .collect();

        let min_price = Statistics::min(&all_prices);
        let max_price = Statistics::max(&all_prices);
        // Rounding in the running mean can land an ulp outside the extremes.
        let avg_price = Statistics::mean(&all_prices).clamp(min_price, max_price);

        let mut top_fixed_price = fixed_prices;
        top_fixed_price.sort_by_key(|&p| Price::from(p));
        top_fixed_price.truncate(self.top_n);

        // Stable sort: auctions ending at the same instant keep input order.
        auctions.sort_by_key(|a| a.end.at);
        auctions.truncate(self.top_n);
        let (top_auction, top_auction_end_times) =
            auctions.into_iter().map(|a| (a.price, a.end)).unzip();

        Ok(StatsSummary {
            total_listings: reported_total,
            avg_price,
            min_price,
            max_price,
            all_prices,
            top_fixed_price,
            top_auction,
            top_auction_end_times,
        })
    }
}

/// Summarize with the default top-N length.
pub fn summarize(listings: &[RawListing], reported_total: u64) -> Result<StatsSummary, EmptyResult> {
    ListingAggregator::default().summarize(listings, reported_total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use listing_core::RawPrice;

    fn end_time(minute: u32) -> String {
        format!("2025-05-10T12:{:02}:00.000Z", minute)
    }

    fn assert_min_avg_max(summary: &StatsSummary) {
        assert!(summary.min_price <= summary.avg_price);
        assert!(summary.avg_price <= summary.max_price);
    }

    #[test]
    fn test_two_fixed_prices() {
        let listings = vec![RawListing::fixed_price(10.0), RawListing::fixed_price(20.0)];

        let summary = summarize(&listings, 2).unwrap();
        assert_eq!(summary.total_listings, 2);
        assert_relative_eq!(summary.avg_price, 15.0);
        assert_relative_eq!(summary.min_price, 10.0);
        assert_relative_eq!(summary.max_price, 20.0);
        assert_eq!(summary.top_fixed_price, vec![10.0, 20.0]);
        assert!(summary.top_auction.is_empty());
        assert!(summary.top_auction_end_times.is_empty());
        assert_eq!(summary.all_prices, vec![10.0, 20.0]);
    }

    #[test]
    fn test_only_bad_auction_is_empty() {
        let listings = vec![RawListing::auction(25.0, "bad-date")];
        assert_eq!(summarize(&listings, 1), Err(EmptyResult));
    }

    #[test]
    fn test_non_numeric_price_dropped() {
        let listings = vec![RawListing::fixed_price("N/A"), RawListing::fixed_price(4.0)];

        let summary = summarize(&listings, 2).unwrap();
        assert_eq!(summary.all_prices, vec![4.0]);
        assert_eq!(summary.top_fixed_price, vec![4.0]);

        let only_bad = vec![RawListing::fixed_price("N/A")];
        assert_eq!(summarize(&only_bad, 1), Err(EmptyResult));
    }

    #[test]
    fn test_top_fixed_price_keeps_five_lowest() {
        let listings: Vec<RawListing> = [7.0, 3.0, 1.0, 6.0, 2.0, 5.0, 4.0]
            .into_iter()
            .map(RawListing::fixed_price)
            .collect();

        let summary = summarize(&listings, 7).unwrap();
        assert_eq!(summary.top_fixed_price, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(summary.all_prices, vec![7.0, 3.0, 1.0, 6.0, 2.0, 5.0, 4.0]);
        assert_relative_eq!(summary.avg_price, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_auctions_ranked_by_end_time_not_price() {
        // Input order differs from end-time order.
        let listings = vec![
            RawListing::auction(30.0, end_time(3)),
            RawListing::auction(50.0, end_time(1)),
            RawListing::auction(10.0, end_time(2)),
        ];

        let summary = summarize(&listings, 3).unwrap();
        assert_eq!(summary.top_auction, vec![50.0, 10.0, 30.0]);
        let ends: Vec<&str> = summary
            .top_auction_end_times
            .iter()
            .map(|e| e.raw.as_str())
            .collect();
        assert_eq!(ends, vec![end_time(1), end_time(2), end_time(3)]);
        assert_eq!(summary.all_prices, vec![30.0, 50.0, 10.0]);
    }

    #[test]
    fn test_top_auction_capped_and_sorted() {
        let listings: Vec<RawListing> = (0..8u32)
            .rev()
            .map(|m| RawListing::auction(f64::from(m) * 10.0, end_time(m)))
            .collect();

        let summary = summarize(&listings, 8).unwrap();
        assert_eq!(summary.top_auction.len(), 5);
        assert_eq!(summary.top_auction, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert!(summary
            .top_auction_end_times
            .windows(2)
            .all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_equal_end_times_keep_input_order() {
        let listings = vec![
            RawListing::auction(9.0, end_time(5)),
            RawListing::auction(1.0, end_time(5)),
            RawListing::auction(4.0, end_time(2)),
        ];

        let summary = summarize(&listings, 3).unwrap();
        assert_eq!(summary.top_auction, vec![4.0, 9.0, 1.0]);
    }

    #[test]
    fn test_pool_order_fixed_then_auction() {
        let listings = vec![
            RawListing::auction(100.0, end_time(1)),
            RawListing::fixed_price(5.0),
            RawListing::auction(200.0, end_time(0)),
            RawListing::fixed_price(3.0),
        ];

        let summary = summarize(&listings, 4).unwrap();
        assert_eq!(summary.all_prices, vec![5.0, 3.0, 100.0, 200.0]);
        assert_eq!(summary.top_fixed_price, vec![3.0, 5.0]);
        assert_eq!(summary.top_auction, vec![200.0, 100.0]);
        assert_relative_eq!(summary.min_price, 3.0);
        assert_relative_eq!(summary.max_price, 200.0);
        assert_relative_eq!(summary.avg_price, 77.0);
        assert_min_avg_max(&summary);
    }

    #[test]
    fn test_reported_total_passed_through() {
        let listings = vec![RawListing::fixed_price(1.0), RawListing::fixed_price("x")];
        let summary = summarize(&listings, 12_345).unwrap();
        assert_eq!(summary.total_listings, 12_345);
        assert_eq!(summary.survivor_count(), 1);
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let listings = vec![
            RawListing::new(RawPrice::Missing, ["FIXED_PRICE"]),
            RawListing::fixed_price(8.0),
        ];

        let summary = summarize(&listings, 2).unwrap();
        assert_eq!(summary.all_prices, vec![0.0, 8.0]);
        assert_relative_eq!(summary.min_price, 0.0);
        assert_relative_eq!(summary.avg_price, 4.0);
    }

    #[test]
    fn test_untagged_and_empty_inputs() {
        assert_eq!(summarize(&[], 0), Err(EmptyResult));

        let untagged = vec![RawListing::new(5.0, ["BEST_OFFER"])];
        assert_eq!(summarize(&untagged, 1), Err(EmptyResult));
    }

    #[test]
    fn test_custom_top_n() {
        let aggregator = ListingAggregator::from_config(&AggregationConfig { top_n: 2 });
        let listings = vec![
            RawListing::fixed_price(3.0),
            RawListing::fixed_price(1.0),
            RawListing::fixed_price(2.0),
        ];

        let summary = aggregator.summarize(&listings, 3).unwrap();
        assert_eq!(aggregator.top_n(), 2);
        assert_eq!(summary.top_fixed_price, vec![1.0, 2.0]);
        assert_eq!(summary.all_prices.len(), 3);
    }

    #[test]
    fn test_min_avg_max_ordering_holds() {
        let prices = [0.1, 0.2, 0.3, 1e9, 7.77, 0.1, 3.3333];
        let listings: Vec<RawListing> = prices.into_iter().map(RawListing::fixed_price).collect();

        let summary = summarize(&listings, prices.len() as u64).unwrap();
        assert_min_avg_max(&summary);

        let same: Vec<RawListing> = (0..10).map(|_| RawListing::fixed_price(0.1)).collect();
        let summary = summarize(&same, 10).unwrap();
        assert_min_avg_max(&summary);
        assert_relative_eq!(summary.avg_price, 0.1);
    }

    #[test]
    fn test_repeated_calls_identical() {
        let listings = vec![
            RawListing::fixed_price("12.00"),
            RawListing::auction(3.0, end_time(9)),
        ];
        assert_eq!(summarize(&listings, 2), summarize(&listings, 2));
    }
}
