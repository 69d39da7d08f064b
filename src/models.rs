//! Data models shared across bridge operations.
//!
//! Order records stay loosely typed ([`OrderData`]) because callers submit
//! heterogeneous field sets and resolution steps enrich the record in
//! place. Catalog and contact records are typed, with unknown provider
//! fields preserved through flattened maps.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

/// Loosely-typed order record submitted by the caller.
///
/// Recognized fields include the contact references (`admin_id`, `tech_id`,
/// `org_id`), `product` (catalog key), `domain`/`fqdn`, `csr`, `dcv_method`,
/// `approver_email`, `amount` (term in years), `server_count`,
/// `webserver_type`, `order_id` (reissue) and `remoteid` (status lookups).
/// Resolution steps attach the resolved contacts and product record under
/// `admin`/`tech`/`org`/`product`.
pub type OrderData = Map<String, Value>;

/// Catalog entry for one provider product.
///
/// `remoteid` and `eid` are not part of the provider response; the catalog
/// listing fills them in (`remoteid` copies `id`, `eid` is the canonical
/// key derived from `name`). All other provider fields are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Provider-side numeric product identifier.
    #[serde(deserialize_with = "de_loose_i64")]
    pub id: i64,
    /// Display name as published by the provider.
    pub name: String,
    /// Copy of [`id`](Self::id), under the name the order-management caller
    /// expects.
    #[serde(default, skip_deserializing)]
    pub remoteid: i64,
    /// Canonical catalog key derived from the display name.
    #[serde(default, skip_deserializing)]
    pub eid: String,
    /// Remaining provider fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the provider price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Provider-side numeric product identifier.
    #[serde(deserialize_with = "de_loose_i64")]
    pub product_id: i64,
    /// Base price, when the provider publishes one at the top level.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Remaining provider fields (per-period prices, currency, and so on).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contact record resolved from the external contact store.
///
/// The store owns these records; the bridge only reads them. Every field
/// defaults to empty so partially filled store records still resolve, and
/// the payload assembly rules decide what missing values mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Contact email address.
    #[serde(default)]
    pub email: String,
    /// Salutation or title; empty when the store has none.
    #[serde(default)]
    pub title: String,
    /// Phone number in whatever format the store holds.
    #[serde(default)]
    pub phone: String,
    /// Remaining store fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepts integers, floats and numeric strings; the provider is not
/// consistent about which it sends.
fn de_loose_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        #[allow(
            clippy::cast_possible_truncation,
            reason = "provider ids are small integers even when sent as floats"
        )]
        Raw::Float(f) => Ok(f as i64),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid numeric id: {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_id_from_string() {
        let product: Product =
            serde_json::from_value(json!({"id": "42", "name": "EV SSL Pro"})).unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.name, "EV SSL Pro");
        assert_eq!(product.remoteid, 0);
        assert!(product.eid.is_empty());
    }

    #[test]
    fn test_product_id_from_number() {
        let product: Product =
            serde_json::from_value(json!({"id": 7, "name": "Wildcard"})).unwrap();
        assert_eq!(product.id, 7);
    }

    #[test]
    fn test_product_keeps_unknown_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": 7,
            "name": "Wildcard",
            "brand": "acme",
            "wildcard_enabled": "1"
        }))
        .unwrap();
        assert_eq!(product.extra["brand"], json!("acme"));
        assert_eq!(product.extra["wildcard_enabled"], json!("1"));
    }

    #[test]
    fn test_product_rejects_non_numeric_id() {
        let result: Result<Product, _> =
            serde_json::from_value(json!({"id": "seven", "name": "Wildcard"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_price_entry_from_string_price() {
        let entry: PriceEntry =
            serde_json::from_value(json!({"product_id": "71", "price": "45.00"})).unwrap();
        assert_eq!(entry.product_id, 71);
        assert_eq!(entry.price, Some(Decimal::new(4500, 2)));
    }

    #[test]
    fn test_price_entry_without_top_level_price() {
        let entry: PriceEntry =
            serde_json::from_value(json!({"product_id": 71, "price_12": "45.00"})).unwrap();
        assert!(entry.price.is_none());
        assert_eq!(entry.extra["price_12"], json!("45.00"));
    }

    #[test]
    fn test_contact_defaults_missing_fields() {
        let contact: Contact =
            serde_json::from_value(json!({"first_name": "Ada", "email": "ada@example.com"}))
                .unwrap();
        assert_eq!(contact.first_name, "Ada");
        assert!(contact.title.is_empty());
        assert!(contact.phone.is_empty());
    }

    #[test]
    fn test_contact_roundtrips_extra_fields() {
        let contact: Contact = serde_json::from_value(json!({
            "first_name": "Ada",
            "company": "Analytical Engines Ltd"
        }))
        .unwrap();
        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["company"], json!("Analytical Engines Ltd"));
    }
}
