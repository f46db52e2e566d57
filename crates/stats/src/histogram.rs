//! Price distribution histogram.
//!
//! Buckets a price pool into equal-width bins spanning its range and renders
//! the counts as text bars.

use listing_core::Price;
use std::collections::BTreeMap;
use std::fmt::Write;

/// One histogram bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    /// Lower edge (inclusive).
    pub lower: f64,
    /// Upper edge (exclusive, except for the last bin).
    pub upper: f64,
    /// Number of prices in the bin.
    pub count: u64,
}

/// Equal-width price histogram.
#[derive(Debug, Clone, Default)]
pub struct PriceHistogram {
    /// Counts keyed by bin lower edge.
    counts: BTreeMap<Price, u64>,
    /// Bin width.
    bin_width: f64,
    /// Upper edge of the last bin.
    upper: f64,
}

impl PriceHistogram {
    /// Build a histogram with `bins` equal-width bins over `[min, max]` of
    /// `prices`.
    ///
    /// When every price is equal the range is widened by `max(0.5, |v| * 1e-9)`
    /// on each side, so large values still get distinct bin edges.
    /// Empty input or zero bins gives an empty histogram.
    pub fn from_prices(prices: &[f64], bins: usize) -> Self {
        if prices.is_empty() || bins == 0 {
            return Self::default();
        }

        let mut lower = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let mut upper = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lower == upper {
            let pad = (lower.abs() * 1e-9).max(0.5);
            lower -= pad;
            upper += pad;
        }
        let bin_width = (upper - lower) / bins as f64;

        let mut counts: BTreeMap<Price, u64> = (0..bins)
            .map(|i| (Price::from(lower + i as f64 * bin_width), 0))
            .collect();

        for &price in prices {
            let index = (((price - lower) / bin_width).floor() as usize).min(bins - 1);
            let key = Price::from(lower + index as f64 * bin_width);
            *counts.entry(key).or_insert(0) += 1;
        }

        Self {
            counts,
            bin_width,
            upper,
        }
    }

    /// Bins in ascending price order.
    pub fn bins(&self) -> Vec<HistogramBin> {
        let last = self.counts.len().saturating_sub(1);
        self.counts
            .iter()
            .enumerate()
            .map(|(i, (&lower, &count))| HistogramBin {
                lower: lower.0,
                upper: if i == last { self.upper } else { lower.0 + self.bin_width },
                count,
            })
            .collect()
    }

    /// Number of bins.
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// Width of each bin.
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Total number of prices counted.
    pub fn total_count(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Largest bin count.
    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Whether the histogram holds no prices.
    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Render as text bars, the fullest bin spanning `bar_width` characters.
    pub fn render(&self, bar_width: usize) -> String {
        let max = self.max_count();
        let mut out = String::new();
        for bin in self.bins() {
            let mut len = if max > 0 {
                ((bin.count as f64 / max as f64) * bar_width as f64).round() as usize
            } else {
                0
            };
            // Non-empty bins stay visible.
            if bin.count > 0 && len == 0 {
                len = 1;
            }
            let _ = writeln!(
                out,
                "  ${:>10.2} - ${:>10.2} | {:<width$} {}",
                bin.lower,
                bin.upper,
                "#".repeat(len),
                bin.count,
                width = bar_width
            );
        }
        out
    }
}
