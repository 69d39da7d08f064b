//! Provider-facing layer.
//!
//! Everything that knows about the reseller API as a remote service lives
//! here: the command set, endpoint and credential configuration, the
//! response classifier, and the transport abstraction with its HTTP
//! implementation.

pub mod command;
pub mod config;
pub mod http;
pub(crate) mod response;
pub mod transport;

pub use command::ProviderCommand;
pub use config::{AuthConfig, Credentials, EndpointConfig, ProviderConfig};
pub use http::HttpTransport;
pub use transport::ProviderTransport;
