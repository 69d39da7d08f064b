//! Provider configuration.
//!
//! TOML-deserializable configuration for one reseller provider: base URL,
//! optional endpoint path overrides and environment-variable references
//! for the API credentials. Validation runs before any call is made and
//! rejects configurations that would send credentials somewhere unsafe.

use serde::Deserialize;
use url::Url;

use crate::error::{Result, TaggedError};

/// Root provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Provider display name, used in log events only.
    pub name: String,

    /// Base URL for the provider API.
    pub base_url: String,

    /// Endpoint path overrides.
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Credential configuration.
    pub auth: AuthConfig,
}

impl ProviderConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing or validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use ssl_reseller_bridge::provider::ProviderConfig;
    ///
    /// let config = ProviderConfig::from_toml(
    ///     r#"
    ///     name = "reseller"
    ///     base_url = "https://api.reseller.example"
    ///
    ///     [auth]
    ///     login_env = "RESELLER_LOGIN"
    ///     password_env = "RESELLER_PASSWORD"
    ///     "#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.name, "reseller");
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| TaggedError::config(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsing fails.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TaggedError::config(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// Checks that the base URL is HTTPS and not a loopback address, that
    /// endpoint templates are safe relative paths, and that credential
    /// environment variable names are well formed.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::Config` if any check fails.
    pub fn validate(&self) -> Result<()> {
        self.validate_base_url()?;
        self.endpoints.validate()?;
        self.auth.validate()?;
        Ok(())
    }

    fn validate_base_url(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            TaggedError::config(format!("invalid base_url '{}': {e}", self.base_url))
        })?;

        if url.scheme() != "https" {
            return Err(TaggedError::config(format!(
                "base_url must use HTTPS, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str() {
            let host_lower = host.to_lowercase();
            if host_lower == "localhost"
                || host_lower == "::1"
                || host_lower == "[::1]"
                || host_lower.starts_with("127.")
            {
                return Err(TaggedError::config(format!(
                    "base_url must not be localhost or loopback: {host}"
                )));
            }
        }

        Ok(())
    }
}

/// Endpoint path overrides, with `{id}` as the placeholder in templates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    /// Session authentication endpoint (default: "/auth/").
    pub auth: Option<String>,
    /// Product catalog endpoint (default: "/products/").
    pub products: Option<String>,
    /// Price list endpoint (default: "/products/all_prices/").
    pub product_prices: Option<String>,
    /// Order status endpoint template (default: "/orders/status/{id}").
    pub order_status: Option<String>,
    /// CSR generation endpoint (default: "/tools/csr/generate/").
    pub generate_csr: Option<String>,
    /// Domain approver email endpoint (default: "/tools/domain/emails/").
    pub domain_emails: Option<String>,
    /// New order endpoint (default: "/orders/add_ssl_order/").
    pub add_order: Option<String>,
    /// Renewal order endpoint (default: "/orders/add_ssl_renew_order/").
    pub add_renew_order: Option<String>,
    /// Reissue endpoint template (default: "/orders/ssl/reissue/{id}").
    pub reissue_order: Option<String>,
}

impl EndpointConfig {
    /// Validates endpoint templates.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::Config` if any endpoint template is unsafe.
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("auth", &self.auth),
            ("products", &self.products),
            ("product_prices", &self.product_prices),
            ("order_status", &self.order_status),
            ("generate_csr", &self.generate_csr),
            ("domain_emails", &self.domain_emails),
            ("add_order", &self.add_order),
            ("add_renew_order", &self.add_renew_order),
            ("reissue_order", &self.reissue_order),
        ];

        for (name, endpoint) in endpoints {
            if let Some(path) = endpoint {
                validate_endpoint_path(name, path)?;
            }
        }

        Ok(())
    }

    pub(crate) fn auth_path(&self) -> String {
        self.auth.as_ref().map_or_else(|| "/auth/".to_owned(), Clone::clone)
    }

    pub(crate) fn products_path(&self) -> String {
        self.products.as_ref().map_or_else(|| "/products/".to_owned(), Clone::clone)
    }

    pub(crate) fn product_prices_path(&self) -> String {
        self.product_prices
            .as_ref()
            .map_or_else(|| "/products/all_prices/".to_owned(), Clone::clone)
    }

    pub(crate) fn order_status_path(&self, id: &str) -> String {
        self.order_status.as_ref().map_or_else(
            || format!("/orders/status/{id}"),
            |template| template.replace("{id}", id),
        )
    }

    pub(crate) fn generate_csr_path(&self) -> String {
        self.generate_csr
            .as_ref()
            .map_or_else(|| "/tools/csr/generate/".to_owned(), Clone::clone)
    }

    pub(crate) fn domain_emails_path(&self) -> String {
        self.domain_emails
            .as_ref()
            .map_or_else(|| "/tools/domain/emails/".to_owned(), Clone::clone)
    }

    pub(crate) fn add_order_path(&self) -> String {
        self.add_order
            .as_ref()
            .map_or_else(|| "/orders/add_ssl_order/".to_owned(), Clone::clone)
    }

    pub(crate) fn add_renew_order_path(&self) -> String {
        self.add_renew_order
            .as_ref()
            .map_or_else(|| "/orders/add_ssl_renew_order/".to_owned(), Clone::clone)
    }

    pub(crate) fn reissue_order_path(&self, id: &str) -> String {
        self.reissue_order.as_ref().map_or_else(
            || format!("/orders/ssl/reissue/{id}"),
            |template| template.replace("{id}", id),
        )
    }
}

fn validate_endpoint_path(name: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(TaggedError::config(format!(
            "endpoint '{name}' contains path traversal sequence '..': {path}"
        )));
    }

    if path.contains("//") {
        return Err(TaggedError::config(format!(
            "endpoint '{name}' contains double slash '//': {path}"
        )));
    }

    if !path.starts_with('/') {
        return Err(TaggedError::config(format!(
            "endpoint '{name}' must start with '/': {path}"
        )));
    }

    Ok(())
}

/// Credential configuration. Credentials are never written in config
/// files; the file names the environment variables holding them.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the API login.
    pub login_env: String,
    /// Environment variable holding the API password.
    pub password_env: String,
}

impl AuthConfig {
    /// Validates the environment variable names.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::Config` if a name is empty or malformed.
    pub fn validate(&self) -> Result<()> {
        validate_env_var_name(&self.login_env)?;
        validate_env_var_name(&self.password_env)?;
        Ok(())
    }

    /// Reads the credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::Config` if either variable is unset.
    pub fn resolve(&self) -> Result<Credentials> {
        let login = std::env::var(&self.login_env).map_err(|_| {
            TaggedError::config(format!("environment variable {} is not set", self.login_env))
        })?;
        let password = std::env::var(&self.password_env).map_err(|_| {
            TaggedError::config(format!("environment variable {} is not set", self.password_env))
        })?;
        Ok(Credentials { login, password })
    }
}

fn validate_env_var_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TaggedError::config("environment variable name cannot be empty"));
    }

    let Some(first_char) = name.chars().next() else {
        return Err(TaggedError::config("environment variable name cannot be empty"));
    };
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(TaggedError::config(format!(
            "environment variable name must start with letter or underscore: {name}"
        )));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(TaggedError::config(format!(
                "environment variable name contains invalid character '{ch}': {name}"
            )));
        }
    }

    Ok(())
}

/// Resolved API credentials.
#[derive(Clone)]
pub struct Credentials {
    /// API login.
    pub login: String,
    /// API password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from literal values, bypassing the environment.
    #[must_use]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self { login: login.into(), password: password.into() }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}
