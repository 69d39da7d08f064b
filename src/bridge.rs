//! Certificate lifecycle facade.
//!
//! [`ResellerBridge`] is what order-management callers hold: one instance
//! per provider account, exposing catalog listing, status lookup, CSR
//! generation and the issue/renew/reissue operations. Internally every
//! provider call flows through a single request path that establishes the
//! session lazily, dispatches the command and normalizes the raw response
//! into the uniform result shape.
//!
//! # Session lifecycle
//!
//! Authentication happens at most once per bridge instance, on the first
//! operation that needs the provider. The outcome, success or failure, is
//! cached for the lifetime of the instance: a failed login is replayed to
//! every subsequent caller rather than retried. There is no re-login or
//! refresh. Long-lived hosts that need a fresh session construct a fresh
//! bridge; keeping the cache one-shot keeps every operation's view of the
//! session consistent.

use std::{collections::HashMap, sync::Arc};

use serde_json::{Map, Value, json};
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::{
    catalog,
    contacts::{ContactDirectory, resolve_order_contacts},
    error::Result,
    models::{OrderData, PriceEntry, Product},
    order::{assemble_order, scalar_string},
    provider::{Credentials, HttpTransport, ProviderCommand, ProviderConfig, ProviderTransport, response},
};

/// Session establishment state of one bridge instance.
///
/// The state moves from [`Unattempted`](Self::Unattempted) to exactly one
/// of the terminal states on the first provider operation and never
/// changes again.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No operation has needed the provider yet.
    Unattempted,
    /// The provider accepted the credentials.
    Authenticated,
    /// The login attempt failed; the error is replayed to every
    /// subsequent operation.
    Failed(crate::error::TaggedError),
}

/// Bridge between generic certificate order management and one reseller
/// provider account.
pub struct ResellerBridge {
    credentials: Credentials,
    transport: Arc<dyn ProviderTransport>,
    contacts: Arc<dyn ContactDirectory>,
    session: OnceCell<Result<Value>>,
}

impl ResellerBridge {
    /// Creates a bridge over an explicit transport and contact store.
    #[must_use]
    pub fn new(
        credentials: Credentials,
        transport: Arc<dyn ProviderTransport>,
        contacts: Arc<dyn ContactDirectory>,
    ) -> Self {
        Self { credentials, transport, contacts, session: OnceCell::new() }
    }

    /// Creates a bridge from a provider configuration, using the HTTP
    /// transport and credentials resolved from the environment.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the credentials
    /// cannot be resolved.
    pub fn from_config(
        config: &ProviderConfig,
        contacts: Arc<dyn ContactDirectory>,
    ) -> Result<Self> {
        config.validate()?;
        let credentials = config.auth.resolve()?;
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::new(credentials, transport, contacts))
    }

    /// Current session establishment state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        match self.session.get() {
            None => SessionState::Unattempted,
            Some(Ok(_)) => SessionState::Authenticated,
            Some(Err(err)) => SessionState::Failed(err.clone()),
        }
    }

    /// Establishes the provider session on first use and returns the
    /// cached outcome on every call after that.
    ///
    /// The login response is normalized with an empty context so the
    /// credentials never appear in error data, and without the strict
    /// success requirement: the login call's own error reporting is
    /// definitive.
    async fn ensure_session(&self) -> &Result<Value> {
        self.session
            .get_or_init(|| async {
                info!("establishing provider session");
                let raw = self
                    .transport
                    .authenticate(&self.credentials.login, &self.credentials.password)
                    .await;
                response::normalize(Value::Object(Map::new()), raw, false)
            })
            .await
    }

    /// Single choke point for every provider call.
    ///
    /// Ensures the session, dispatches the command and normalizes the raw
    /// response with the command's context. A cached login failure
    /// short-circuits before the transport is touched. When
    /// `login_required` is set and the cached login payload lacks the
    /// strict success marker, the call also short-circuits, with the
    /// re-classified login outcome.
    async fn request(&self, command: ProviderCommand, login_required: bool) -> Result<Value> {
        match self.ensure_session().await {
            Err(cached) => return Err(cached.clone()),
            Ok(payload) => {
                if login_required && response::is_error(payload, true) {
                    return response::normalize(
                        Value::Object(Map::new()),
                        Ok(payload.clone()),
                        true,
                    );
                }
            }
        }

        let context = command.context();
        let raw = self.transport.call(&command).await;
        response::normalize(context, raw, login_required)
    }

    /// Fetches the provider catalog, keyed by canonical product key.
    ///
    /// The catalog is refetched on every call; nothing is cached. Two
    /// products normalizing to the same key collapse to the later one.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails or the catalog cannot be
    /// parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<HashMap<String, Product>> {
        info!("fetching product catalog");
        let command = ProviderCommand::AllProducts;
        let context = command.context();
        let raw = self.request(command, false).await?;
        catalog::index_products(raw, context)
    }

    /// Fetches the provider price list.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails or the list cannot be
    /// parsed.
    #[instrument(skip(self))]
    pub async fn list_product_prices(&self) -> Result<Vec<PriceEntry>> {
        info!("fetching price list");
        let command = ProviderCommand::AllProductPrices;
        let context = command.context();
        let raw = self.request(command, false).await?;
        catalog::parse_price_list(raw, context)
    }

    /// Looks up the provider-side status of a placed order.
    ///
    /// Forwards the order's `remoteid`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    #[instrument(skip(self, order))]
    pub async fn order_status(&self, order: &OrderData) -> Result<Value> {
        let remote_id = order.get("remoteid").cloned().unwrap_or(Value::Null);
        self.request(ProviderCommand::OrderStatus { remote_id }, false).await
    }

    /// Asks the provider to generate a CSR from the order record.
    ///
    /// The record is forwarded twice, matching the provider's
    /// two-positional-argument call shape.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    #[instrument(skip(self, order))]
    pub async fn generate_csr(&self, order: &OrderData) -> Result<Value> {
        let record = Value::Object(order.clone());
        self.request(
            ProviderCommand::GenerateCsr { subject: record.clone(), organization: record },
            false,
        )
        .await
    }

    /// Lists the approver email addresses the provider accepts for the
    /// order's `fqdn`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    #[instrument(skip(self, order))]
    pub async fn domain_emails(&self, order: &OrderData) -> Result<Value> {
        let domain = order.get("fqdn").cloned().unwrap_or(Value::Null);
        self.request(ProviderCommand::DomainEmails { query: json!({ "domain": domain }) }, false)
            .await
    }

    /// Lists webserver-approver emails for the order's `fqdn`.
    ///
    /// The provider answers this from the same endpoint as
    /// [`domain_emails`](Self::domain_emails); the alias exists because
    /// order-management callers address the two concerns separately.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    pub async fn webserver_emails(&self, order: &OrderData) -> Result<Value> {
        self.domain_emails(order).await
    }

    /// Places a new certificate order.
    ///
    /// Resolves contacts and the product record, assembles the provider
    /// payload and submits it.
    ///
    /// # Errors
    ///
    /// Returns error if contact resolution, catalog fetch or the provider
    /// call fails.
    #[instrument(skip(self, order))]
    pub async fn issue_certificate(&self, order: OrderData) -> Result<Value> {
        info!("placing certificate order");
        let payload = self.prepare_order(order).await?;
        self.request(ProviderCommand::AddOrder { payload: Value::Object(payload) }, false)
            .await
    }

    /// Places a renewal order, built exactly like a new order.
    ///
    /// # Errors
    ///
    /// Returns error if contact resolution, catalog fetch or the provider
    /// call fails.
    #[instrument(skip(self, order))]
    pub async fn renew_certificate(&self, order: OrderData) -> Result<Value> {
        info!("placing certificate renewal order");
        let payload = self.prepare_order(order).await?;
        self.request(ProviderCommand::AddRenewOrder { payload: Value::Object(payload) }, false)
            .await
    }

    /// Reissues an existing order.
    ///
    /// Deliberately skips contact and product resolution: the caller's
    /// record plus its `order_id` are forwarded untouched, which is what
    /// the provider expects for reissue.
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails.
    #[instrument(skip(self, order))]
    pub async fn reissue_certificate(&self, order: OrderData) -> Result<Value> {
        info!("reissuing certificate order");
        let order_id = order.get("order_id").cloned().unwrap_or(Value::Null);
        self.request(
            ProviderCommand::ReissueOrder { order_id, order: Value::Object(order) },
            false,
        )
        .await
    }

    /// Resolves a canonical product key against a fresh catalog fetch.
    ///
    /// A missing product is not an error here; the caller decides what an
    /// absent record means.
    async fn find_product(&self, key: &str) -> Result<Option<Product>> {
        let mut products = self.list_products().await?;
        Ok(products.remove(key))
    }

    /// Builds the provider payload for issue and renew orders.
    ///
    /// Contact resolution failures and catalog fetch failures propagate.
    /// A product key that is simply absent from the catalog attaches as
    /// JSON null and assembly proceeds, leaving `product_id` null in the
    /// payload for the provider to reject. Existing callers depend on
    /// that provider-side rejection; see the regression test pinning it.
    async fn prepare_order(&self, mut order: OrderData) -> Result<OrderData> {
        resolve_order_contacts(&mut order, self.contacts.as_ref()).await?;

        let key = order.get("product").map(scalar_string).unwrap_or_default();
        let product = self
            .find_product(&key)
            .await?
            .and_then(|product| serde_json::to_value(product).ok())
            .unwrap_or(Value::Null);
        order.insert("product".to_owned(), product);

        Ok(assemble_order(&Value::Object(order)))
    }
}

impl std::fmt::Debug for ResellerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResellerBridge")
            .field("session", &self.session_state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{
        contacts::ContactDirectory,
        error::{ErrorKind, TaggedError},
        models::Contact,
    };

    struct FakeTransport {
        auth_outcome: Result<Value>,
        call_outcome: Value,
        auth_calls: AtomicUsize,
    }

    impl FakeTransport {
        fn new(auth_outcome: Result<Value>) -> Self {
            Self {
                auth_outcome,
                call_outcome: json!({"ok": true}),
                auth_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProviderTransport for FakeTransport {
        async fn authenticate(&self, _login: &str, _password: &str) -> Result<Value> {
            self.auth_calls.fetch_add(1, Ordering::SeqCst);
            self.auth_outcome.clone()
        }

        async fn call(&self, _command: &ProviderCommand) -> Result<Value> {
            Ok(self.call_outcome.clone())
        }
    }

    struct EmptyDirectory;

    #[async_trait]
    impl ContactDirectory for EmptyDirectory {
        async fn search(&self, _ids: &[String]) -> Result<HashMap<String, Contact>> {
            Ok(HashMap::new())
        }
    }

    fn bridge_with(transport: Arc<FakeTransport>) -> ResellerBridge {
        ResellerBridge::new(
            Credentials::new("merchant", "secret"),
            transport,
            Arc::new(EmptyDirectory),
        )
    }

    #[tokio::test]
    async fn test_session_state_transitions_once() {
        let transport = Arc::new(FakeTransport::new(Ok(json!({"success": true, "key": "k"}))));
        let bridge = bridge_with(Arc::clone(&transport));

        assert_eq!(bridge.session_state(), SessionState::Unattempted);

        bridge.request(ProviderCommand::AllProducts, false).await.unwrap();
        assert_eq!(bridge.session_state(), SessionState::Authenticated);

        bridge.request(ProviderCommand::AllProductPrices, false).await.unwrap();
        assert_eq!(transport.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_login_is_cached_and_replayed() {
        let transport = Arc::new(FakeTransport::new(Ok(
            json!({"error": true, "description": "bad credentials"}),
        )));
        let bridge = bridge_with(Arc::clone(&transport));

        let first = bridge.request(ProviderCommand::AllProducts, false).await.unwrap_err();
        let second = bridge
            .request(ProviderCommand::AllProductPrices, false)
            .await
            .unwrap_err();

        assert_eq!(first, second);
        assert_eq!(first.message, "bad credentials");
        assert_eq!(transport.auth_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.session_state(), SessionState::Failed(first));
    }

    #[tokio::test]
    async fn test_login_required_demands_strict_success_marker() {
        let transport = Arc::new(FakeTransport::new(Ok(json!({"success": "1", "key": "k"}))));
        let bridge = bridge_with(transport);

        // Without the flag the call goes through.
        bridge
            .request(ProviderCommand::AllProducts, false)
            .await
            .unwrap();

        // With the flag the loose success marker is not good enough.
        let err = bridge
            .request(ProviderCommand::AllProducts, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.message, "unknown error");
    }

    #[tokio::test]
    async fn test_login_required_passes_with_strict_success() {
        let transport = Arc::new(FakeTransport::new(Ok(json!({"success": true, "key": "k"}))));
        let bridge = bridge_with(transport);

        let result = bridge.request(ProviderCommand::AllProducts, true).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_transport_level_login_failure_replayed() {
        let inner = TaggedError::transport(json!({}), "connection refused");
        let transport = Arc::new(FakeTransport::new(Err(inner.clone())));
        let bridge = bridge_with(Arc::clone(&transport));

        let first = bridge.request(ProviderCommand::AllProducts, false).await.unwrap_err();
        let second = bridge.request(ProviderCommand::AllProducts, false).await.unwrap_err();

        assert_eq!(first, inner);
        assert_eq!(second, inner);
        assert_eq!(transport.auth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_login_response_is_an_error() {
        let transport = Arc::new(FakeTransport::new(Ok(json!({}))));
        let bridge = bridge_with(transport);

        let err = bridge.request(ProviderCommand::AllProducts, false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyResponse);
    }
}
