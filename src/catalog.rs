//! Product catalog handling.
//!
//! The provider publishes its catalog as a flat product list keyed by a
//! numeric id. Order-management callers refer to products by a canonical
//! text key instead, so every listing derives that key from the display
//! name and re-keys the catalog by it. The catalog is rebuilt from the
//! provider on every lookup; nothing here caches across calls.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Result, TaggedError},
    models::{PriceEntry, Product},
};

/// Derives the canonical catalog key for a product display name.
///
/// Every character outside `[A-Za-z0-9_]` becomes an underscore, runs of
/// underscores collapse to one, leading and trailing underscores are
/// trimmed, and the result is lowercased. The function is pure and
/// idempotent.
///
/// # Examples
///
/// ```
/// use ssl_reseller_bridge::catalog::normalize_key;
///
/// assert_eq!(normalize_key("EV SSL--Pro"), "ev_ssl_pro");
/// assert_eq!(normalize_key("  Wildcard (DV) "), "wildcard_dv");
/// ```
#[must_use]
pub fn normalize_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for ch in label.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '_' {
            ch.to_ascii_lowercase()
        } else {
            '_'
        };
        if mapped == '_' && key.ends_with('_') {
            continue;
        }
        key.push(mapped);
    }
    key.trim_matches('_').to_owned()
}

#[derive(Deserialize)]
struct RawCatalog {
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct RawPriceList {
    product_prices: Vec<PriceEntry>,
}

/// Indexes a raw catalog response by canonical key.
///
/// Copies each entry's `id` into `remoteid` and derives `eid` from the
/// display name. Two products normalizing to the same key silently
/// overwrite; the last entry wins. That collision behavior matches what
/// existing callers depend on and is covered by tests rather than fixed.
pub(crate) fn index_products(raw: Value, context: Value) -> Result<HashMap<String, Product>> {
    let catalog: RawCatalog = serde_json::from_value(raw).map_err(|e| {
        TaggedError::transport(context, format!("failed to parse product catalog: {e}"))
    })?;

    let mut indexed = HashMap::with_capacity(catalog.products.len());
    for mut product in catalog.products {
        product.remoteid = product.id;
        product.eid = normalize_key(&product.name);
        indexed.insert(product.eid.clone(), product);
    }
    Ok(indexed)
}

/// Parses the raw price list response into typed entries.
pub(crate) fn parse_price_list(raw: Value, context: Value) -> Result<Vec<PriceEntry>> {
    let prices: RawPriceList = serde_json::from_value(raw).map_err(|e| {
        TaggedError::transport(context, format!("failed to parse price list: {e}"))
    })?;
    Ok(prices.product_prices)
}
