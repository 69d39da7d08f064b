//! Provider response classification and normalization.
//!
//! The reseller API does not report failure uniformly: some endpoints
//! return an `error` object, some return `success` flags, some return
//! nothing at all, and at least one returns `"success": "1"` where a
//! boolean is expected. This module is the single place that decides
//! whether a raw response means failure, and shapes every provider call's
//! outcome into the bridge's uniform [`Result`].

use serde_json::Value;

use crate::{
    error::{Result, TaggedError},
    order::{is_truthy, scalar_string},
};

/// Decides whether a raw provider response represents failure.
///
/// An `error` field always means failure. When `login_required` is set the
/// response must additionally carry `success` as the strict JSON boolean
/// `true`; the string `"1"` or number `1` some endpoints send does NOT
/// satisfy the check. That strictness is a provider quirk callers rely on.
pub(crate) fn is_error(response: &Value, login_required: bool) -> bool {
    if response.get("error").is_some() {
        return true;
    }
    if !login_required {
        return false;
    }
    response.get("success") != Some(&Value::Bool(true))
}

/// A response with no content at all: JSON null, `{}` or `[]`.
pub(crate) fn is_empty_response(response: &Value) -> bool {
    match response {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Normalizes one provider call outcome into the uniform result shape.
///
/// In order:
/// 1. an error produced by a lower layer passes through unchanged;
/// 2. an empty response becomes an `EmptyResponse` error, regardless of
///    `login_required`;
/// 3. a response classified as failure becomes a `Transport` error built
///    from the call `context` and the response's `description`, falling
///    back to `"unknown error"` when the description is absent or blank;
/// 4. anything else is returned unchanged. The context is deliberately
///    never merged into success payloads; it exists for error reporting
///    only.
pub(crate) fn normalize(context: Value, outcome: Result<Value>, login_required: bool) -> Result<Value> {
    let response = outcome?;
    if is_empty_response(&response) {
        return Err(TaggedError::empty_response(context));
    }
    if is_error(&response, login_required) {
        return Err(TaggedError::transport(context, describe_failure(&response)));
    }
    Ok(response)
}

fn describe_failure(response: &Value) -> String {
    match response.get("description") {
        Some(description) if is_truthy(description) => scalar_string(description),
        _ => "unknown error".to_owned(),
    }
}
