//! Item summary search response decoding.
//!
//! Turns the JSON body of a Browse API `item_summary/search` call into raw
//! listings. Only the top-level shape is validated here; per-item defects are
//! carried through as raw values and dropped later by the classifier.

use listing_core::{Error, RawListing, RawPrice, Result};
use serde_json::Value;
use tracing::debug;

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Total matches reported by the source.
    pub total: u64,
    /// Records returned on this page.
    pub listings: Vec<RawListing>,
}

/// Decode a search response body.
pub fn decode_search_response(body: &Value) -> Result<SearchPage> {
    let root = body
        .as_object()
        .ok_or_else(|| Error::payload("response body is not a JSON object"))?;

    let items = root
        .get("itemSummaries")
        .ok_or_else(|| Error::payload("missing itemSummaries"))?
        .as_array()
        .ok_or_else(|| Error::payload("itemSummaries is not an array"))?;

    if items.is_empty() {
        return Err(Error::NoResults);
    }

    let total = root
        .get("total")
        .and_then(Value::as_u64)
        .unwrap_or(items.len() as u64);

    let listings: Vec<RawListing> = items.iter().map(raw_listing).collect();
    debug!(total, records = listings.len(), "decoded search page");
    Ok(SearchPage { total, listings })
}

/// Decode a search response from its text form.
pub fn decode_search_str(text: &str) -> Result<SearchPage> {
    let body: Value = serde_json::from_str(text)?;
    decode_search_response(&body)
}

fn raw_listing(item: &Value) -> RawListing {
    let text_field = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);

    let buying_options = item
        .get("buyingOptions")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    RawListing {
        item_id: text_field("itemId"),
        title: text_field("title"),
        price: raw_price(item),
        buying_options,
        item_end_date: text_field("itemEndDate"),
    }
}

/// Extract `price.value`. A missing `price` object or a missing `value`
/// both count as absent.
fn raw_price(item: &Value) -> RawPrice {
    if !item.is_object() {
        return RawPrice::Malformed;
    }
    let price = match item.get("price") {
        None => return RawPrice::Missing,
        Some(Value::Object(price)) => price,
        Some(_) => return RawPrice::Malformed,
    };

    match price.get("value") {
        None => RawPrice::Missing,
        Some(Value::String(s)) => RawPrice::Text(s.clone()),
        Some(Value::Number(n)) => n.as_f64().map_or(RawPrice::Malformed, RawPrice::Number),
        Some(_) => RawPrice::Malformed,
    }
}
