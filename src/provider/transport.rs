//! Transport abstraction over the reseller API client.
//!
//! The bridge never talks HTTP directly; it issues [`ProviderCommand`]s
//! through this trait. The crate ships a production HTTP implementation
//! ([`HttpTransport`](super::HttpTransport)); tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::Result, provider::ProviderCommand};

/// Low-level client for one reseller provider.
///
/// Both methods return the provider's raw response body; classification of
/// success versus failure happens in the bridge, not here. Implementations
/// report their own failures (connectivity, malformed bodies) as
/// `TaggedError` values like every other layer.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Establishes a provider session with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns error if the call cannot be made or the response cannot be
    /// read.
    async fn authenticate(&self, login: &str, password: &str) -> Result<Value>;

    /// Executes one remote operation.
    ///
    /// # Errors
    ///
    /// Returns error if the call cannot be made or the response cannot be
    /// read.
    async fn call(&self, command: &ProviderCommand) -> Result<Value>;
}
