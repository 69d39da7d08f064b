//! HTTP implementation of the provider transport.
//!
//! Speaks the reseller's REST dialect: form-encoded authentication that
//! yields a session key, and JSON bodies for everything else. The session
//! key is appended to every subsequent call as a query parameter, the way
//! the provider expects.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    error::{Result, TaggedError},
    order::scalar_string,
    provider::{EndpointConfig, ProviderCommand, ProviderConfig, ProviderTransport},
};

/// Timeout for requests to the provider, covering the whole
/// request-response cycle.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Production transport speaking HTTPS to the reseller API.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    endpoints: EndpointConfig,
    auth_key: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Creates a transport for the given provider configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| TaggedError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            endpoints: config.endpoints.clone(),
            auth_key: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn auth_query(&self) -> Vec<(String, String)> {
        match self.auth_key.read().await.as_ref() {
            Some(key) => vec![("auth_key".to_owned(), key.clone())],
            None => Vec::new(),
        }
    }

    async fn get(&self, path: &str, mut query: Vec<(String, String)>, context: Value) -> Result<Value> {
        query.extend(self.auth_query().await);
        let response = self
            .client
            .get(self.url(path))
            .query(&query)
            .send()
            .await
            .map_err(|e| TaggedError::transport(context.clone(), format!("request failed: {e}")))?;
        read_json(response, context).await
    }

    async fn post(&self, path: &str, body: &Value, context: Value) -> Result<Value> {
        let query = self.auth_query().await;
        let response = self
            .client
            .post(self.url(path))
            .query(&query)
            .json(body)
            .send()
            .await
            .map_err(|e| TaggedError::transport(context.clone(), format!("request failed: {e}")))?;
        read_json(response, context).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn authenticate(&self, login: &str, password: &str) -> Result<Value> {
        // Empty context on purpose: credentials must never end up in
        // error data.
        let context = Value::Object(serde_json::Map::new());
        let response = self
            .client
            .post(self.url(&self.endpoints.auth_path()))
            .form(&[("user", login), ("pass", password)])
            .send()
            .await
            .map_err(|e| TaggedError::transport(context.clone(), format!("request failed: {e}")))?;
        let body = read_json(response, context).await?;

        if let Some(key) = body.get("key").and_then(Value::as_str) {
            *self.auth_key.write().await = Some(key.to_owned());
        }
        Ok(body)
    }

    async fn call(&self, command: &ProviderCommand) -> Result<Value> {
        debug!(command = command.wire_name(), "dispatching provider call");
        let context = command.context();
        match command {
            ProviderCommand::AllProducts => {
                self.get(&self.endpoints.products_path(), Vec::new(), context).await
            }
            ProviderCommand::AllProductPrices => {
                self.get(&self.endpoints.product_prices_path(), Vec::new(), context).await
            }
            ProviderCommand::OrderStatus { remote_id } => {
                let path = self.endpoints.order_status_path(&scalar_string(remote_id));
                self.get(&path, Vec::new(), context).await
            }
            ProviderCommand::GenerateCsr { subject, organization } => {
                let body = Value::Array(vec![subject.clone(), organization.clone()]);
                self.post(&self.endpoints.generate_csr_path(), &body, context).await
            }
            ProviderCommand::DomainEmails { query } => {
                self.get(&self.endpoints.domain_emails_path(), query_pairs(query), context).await
            }
            ProviderCommand::AddOrder { payload } => {
                self.post(&self.endpoints.add_order_path(), payload, context).await
            }
            ProviderCommand::AddRenewOrder { payload } => {
                self.post(&self.endpoints.add_renew_order_path(), payload, context).await
            }
            ProviderCommand::ReissueOrder { order_id, order } => {
                let path = self.endpoints.reissue_order_path(&scalar_string(order_id));
                self.post(&path, order, context).await
            }
        }
    }
}

async fn read_json(response: reqwest::Response, context: Value) -> Result<Value> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TaggedError::transport(context.clone(), format!("failed to read response: {e}")))?;

    // The provider encodes failures in JSON bodies even on non-2xx
    // statuses, so the body is parsed first and the status only matters
    // when there is no JSON to work with.
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(TaggedError::transport(
            context,
            format!("provider returned status {status}"),
        )),
        Err(e) => Err(TaggedError::transport(
            context,
            format!("failed to parse provider response: {e}"),
        )),
    }
}

fn query_pairs(query: &Value) -> Vec<(String, String)> {
    match query {
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| (key.clone(), scalar_string(value)))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::provider::AuthConfig;

    fn config() -> ProviderConfig {
        ProviderConfig {
            name: "reseller".to_owned(),
            base_url: "https://api.reseller.example/".to_owned(),
            endpoints: EndpointConfig::default(),
            auth: AuthConfig {
                login_env: "RESELLER_LOGIN".to_owned(),
                password_env: "RESELLER_PASSWORD".to_owned(),
            },
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let transport = HttpTransport::new(&config()).unwrap();
        assert_eq!(
            transport.url("/orders/status/7"),
            "https://api.reseller.example/orders/status/7"
        );
    }

    #[test]
    fn test_query_pairs_from_object() {
        let pairs = query_pairs(&json!({"domain": "example.com", "limit": 5}));
        assert!(pairs.contains(&("domain".to_owned(), "example.com".to_owned())));
        assert!(pairs.contains(&("limit".to_owned(), "5".to_owned())));
    }

    #[test]
    fn test_query_pairs_from_non_object() {
        assert!(query_pairs(&json!("example.com")).is_empty());
        assert!(query_pairs(&Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_auth_query_empty_before_login() {
        let transport = HttpTransport::new(&config()).unwrap();
        assert!(transport.auth_query().await.is_empty());

        *transport.auth_key.write().await = Some("abc123".to_owned());
        assert_eq!(
            transport.auth_query().await,
            vec![("auth_key".to_owned(), "abc123".to_owned())]
        );
    }
}
