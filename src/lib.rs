//! SSL reseller bridge: certificate lifecycle operations over a reseller
//! provider API.
//!
//! Generic order-management callers think in terms of issue, renew,
//! reissue and inspect. Reseller providers think in terms of their own
//! call sequence, flat field layouts and inconsistent response shapes.
//! This crate is the adapter between the two: it assembles the provider's
//! wire payload from a loosely-structured order record plus externally
//! fetched contact and catalog records, and normalizes every provider
//! response into one uniform success/error result shape.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  Order management    │  generic caller
//! └──────────┬───────────┘
//!            │ OrderData + Result<Value, TaggedError>
//! ┌──────────▼───────────┐
//! │   ResellerBridge     │  session cache, request choke point,
//! │   (this crate)       │  contact/catalog resolution, field table
//! └──────────┬───────────┘
//!            │ ProviderCommand
//! ┌──────────▼───────────┐
//! │  Reseller API        │  remote provider (HTTPS)
//! └──────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use ssl_reseller_bridge::{ContactDirectory, ResellerBridge, provider::ProviderConfig};
//!
//! # async fn example(contacts: Arc<dyn ContactDirectory>) -> ssl_reseller_bridge::Result<()> {
//! let config = ProviderConfig::from_toml(
//!     r#"
//!     name = "reseller"
//!     base_url = "https://api.reseller.example"
//!
//!     [auth]
//!     login_env = "RESELLER_LOGIN"
//!     password_env = "RESELLER_PASSWORD"
//!     "#,
//! )?;
//! let bridge = ResellerBridge::from_config(&config, contacts)?;
//!
//! let order = json!({
//!     "admin_id": 1,
//!     "tech_id": 2,
//!     "org_id": 3,
//!     "product": "ev_ssl_pro",
//!     "amount": 2,
//!     "csr": "-----BEGIN CERTIFICATE REQUEST-----",
//!     "dcv_method": "email",
//!     "approver_email": "admin@example.com"
//! });
//! let placed = bridge
//!     .issue_certificate(order.as_object().cloned().unwrap_or_default())
//!     .await?;
//! println!("provider answered: {placed}");
//! # Ok(())
//! # }
//! ```
//!
//! # Module organization
//!
//! - [`bridge`]: the [`ResellerBridge`] facade and session lifecycle
//! - [`order`]: declarative field table building the wire payload
//! - [`catalog`]: canonical product keys and catalog indexing
//! - [`contacts`]: contact store abstraction and order contact resolution
//! - [`provider`]: command set, configuration, response classification
//!   and the HTTP transport
//! - [`error`]: the [`TaggedError`] value threaded through every layer
//!
//! # Error handling
//!
//! No operation panics or throws; everything returns
//! [`Result`](error::Result) with a structured [`TaggedError`] carrying
//! the input context that produced it. Errors pass through intermediate
//! layers unchanged, and a layer that wraps a lower error keeps the inner
//! message.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod bridge;
pub mod catalog;
pub mod contacts;
pub mod error;
pub mod models;
pub mod order;
pub mod provider;

pub use bridge::{ResellerBridge, SessionState};
pub use contacts::ContactDirectory;
pub use error::{ErrorKind, Result, TaggedError};
pub use models::{Contact, OrderData, PriceEntry, Product};
pub use provider::{HttpTransport, ProviderCommand, ProviderTransport};
