//! Configuration structures for the listing-stats system.

use crate::error::{Error, Result};
use crate::types::DEFAULT_TOP_N;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of records the Browse API returns per call.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Marketplace API configuration.
    pub marketplace: MarketplaceConfig,
    /// OAuth token cache configuration.
    pub token: TokenConfig,
    /// Aggregation configuration.
    pub aggregation: AggregationConfig,
    /// Text report configuration.
    pub report: ReportConfig,
    /// Persistence configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load a configuration from a JSON file. Missing sections fall back to
    /// their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.marketplace.limit == 0 || self.marketplace.limit > MAX_PAGE_LIMIT {
            return Err(Error::config(format!(
                "marketplace.limit must be in 1..={}, got {}",
                MAX_PAGE_LIMIT, self.marketplace.limit
            )));
        }
        if self.aggregation.top_n == 0 {
            return Err(Error::config("aggregation.top_n must be positive"));
        }
        if self.report.histogram_bins == 0 {
            return Err(Error::config("report.histogram_bins must be positive"));
        }
        if self.token.expiry_hours == 0 {
            return Err(Error::config("token.expiry_hours must be positive"));
        }
        Ok(())
    }
}

/// Marketplace search API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Item summary search endpoint.
    pub endpoint: String,
    /// Value of the `X-EBAY-C-MARKETPLACE-ID` header.
    pub marketplace_id: String,
    /// Records requested per call (capped at 200).
    pub limit: u32,
    /// Value of the `filter` query parameter.
    pub condition_filter: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.ebay.com/buy/browse/v1/item_summary/search".to_string(),
            marketplace_id: "EBAY_US".to_string(),
            limit: MAX_PAGE_LIMIT,
            condition_filter: "conditions:{NEW|USED}".to_string(),
            timeout_secs: 30,
        }
    }
}

/// OAuth token cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Cache file location. `None` uses the platform config directory.
    pub cache_path: Option<PathBuf>,
    /// Lifetime assigned to a newly stored token.
    pub expiry_hours: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            expiry_hours: 2,
        }
    }
}

/// Aggregation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Length of the cheapest fixed-price and soonest-ending auction lists.
    pub top_n: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Text report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Number of equal-width bins in the price distribution.
    pub histogram_bins: usize,
    /// Width in characters of the longest histogram bar.
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 8,
            bar_width: 40,
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("ebay_stats.db"),
        }
    }
}
