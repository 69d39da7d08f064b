//! Error types for the SSL reseller bridge.
//!
//! Every fallible operation in this crate returns [`Result`], whose error
//! side is always a [`TaggedError`]: a structured value carrying the input
//! context that produced it, a human-readable message, and optional
//! structured detail. Layers that cannot act on an error return it upward
//! unchanged; layers that wrap a lower error keep the inner message and
//! attach their own context.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias for bridge operations.
///
/// All fallible functions in this crate return this type. An `Err` value is
/// never re-interpreted as success by a higher layer.
pub type Result<T> = std::result::Result<T, TaggedError>;

/// Classification of a [`TaggedError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider reported failure, the transport failed, or the
    /// response could not be understood.
    Transport,
    /// The provider returned a response with no content at all.
    EmptyResponse,
    /// A required field was missing from the caller's order record.
    MissingField,
    /// The external contact store reported a failure.
    UpstreamStore,
    /// The provider configuration was rejected before any call was made.
    Config,
}

/// Structured error value used across every layer of the bridge.
///
/// Replaces exception-style propagation: an operation either returns the
/// provider's payload or one of these, and callers match on [`ErrorKind`]
/// or inspect [`detail`](Self::detail) for machine-readable specifics.
#[must_use = "errors should be handled or propagated"]
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TaggedError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Input context that produced the error, e.g. the command and its
    /// arguments, or the order record under resolution.
    pub data: Value,
    /// Optional structured detail, e.g. `{"field": "admin_id"}`.
    pub detail: Option<Value>,
}

impl TaggedError {
    /// Creates an error with the given classification, context and message.
    pub fn new(kind: ErrorKind, data: Value, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), data, detail: None }
    }

    /// Attaches structured detail to the error.
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Creates a [`ErrorKind::Transport`] error with the given context and message.
    pub fn transport(data: Value, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, data, message)
    }

    pub(crate) fn empty_response(data: Value) -> Self {
        Self::new(ErrorKind::EmptyResponse, data, "empty response")
    }

    pub(crate) fn missing_field(data: Value, field: &str) -> Self {
        Self::new(ErrorKind::MissingField, data, "no data given")
            .with_detail(json!({ "field": field }))
    }

    pub(crate) fn upstream_store(data: Value, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamStore, data, message)
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, Value::Null, message)
    }
}
