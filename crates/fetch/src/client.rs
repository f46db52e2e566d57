//! Item summary search client.
//!
//! Issues one blocking search request per call and hands the decoded page to
//! the caller. There is no retry; transport and status failures are returned
//! as errors.

use listing_core::config::{MarketplaceConfig, MAX_PAGE_LIMIT};
use listing_core::{Error, Result};
use listing_ingestion::{decode_search_response, SearchPage};
use reqwest::blocking::{Client, Request};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

/// Header selecting the marketplace a search runs against.
pub const MARKETPLACE_HEADER: &str = "X-EBAY-C-MARKETPLACE-ID";

/// Blocking client for the Browse API item summary search.
pub struct BrowseClient {
    client: Client,
    config: MarketplaceConfig,
}

impl BrowseClient {
    /// Create a new client.
    pub fn new(config: MarketplaceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::fetch(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Records requested per call.
    pub fn page_limit(&self) -> u32 {
        self.config.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Build the search request without sending it.
    pub fn search_request(&self, query: &str, token: &str) -> Result<Request> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::data("search term is empty"));
        }
        if token.is_empty() {
            return Err(Error::token("OAuth token is required"));
        }

        let limit = self.page_limit().to_string();
        self.client
            .get(&self.config.endpoint)
            .bearer_auth(token)
            .header(MARKETPLACE_HEADER, &self.config.marketplace_id)
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("filter", self.config.condition_filter.as_str()),
            ])
            .build()
            .map_err(|e| Error::fetch(format!("invalid search request: {}", e)))
    }

    /// Run a search and decode the response.
    pub fn search(&self, query: &str, token: &str) -> Result<SearchPage> {
        let request = self.search_request(query, token)?;
        info!(query = query.trim(), limit = self.page_limit(), "searching marketplace");

        let response = self
            .client
            .execute(request)
            .map_err(|e| Error::fetch(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::token("OAuth token was rejected (401)"));
        }
        let response = response
            .error_for_status()
            .map_err(|e| Error::fetch(e.to_string()))?;

        let body: Value = response
            .json()
            .map_err(|e| Error::payload(format!("response is not JSON: {}", e)))?;
        let page = decode_search_response(&body)?;

        info!(
            total = page.total,
            records = page.listings.len(),
            "search complete"
        );
        Ok(page)
    }
}
