//! Declarative order payload assembly.
//!
//! The provider's order endpoints want a flat field layout that differs
//! from the caller's order record. Rather than hand-writing the mapping in
//! imperative code, [`ORDER_FIELDS`] declares it as an ordered table of
//! target field to rule, where a rule is either a dotted path into the
//! enriched order context or a small pure function of the whole context.
//! The table is iterated once, in order, to build the wire payload.
//!
//! A path lookup that misses produces JSON null rather than a local error;
//! the provider validates required fields on its side, and callers depend
//! on seeing that provider-side failure instead of a local one.

use serde_json::Value;

use crate::models::OrderData;

/// Signature of a computed rule: whole order context in, wire value out.
pub type ComputeFn = fn(&Value) -> Value;

/// One rule of the field table.
#[derive(Debug)]
pub enum FieldRule {
    /// Copy the value at a dotted path in the order context.
    Path(&'static str),
    /// Compute the value from the whole order context.
    Computed(ComputeFn),
}

/// Target provider fields in wire order, with the rule producing each.
pub const ORDER_FIELDS: &[(&str, FieldRule)] = &[
    ("product_id", FieldRule::Path("product.id")),
    ("period", FieldRule::Computed(period_months)),
    ("dcv_method", FieldRule::Path("dcv_method")),
    ("approver_email", FieldRule::Path("approver_email")),
    ("server_count", FieldRule::Computed(server_count)),
    ("webserver_type", FieldRule::Computed(webserver_type)),
    ("csr", FieldRule::Path("csr")),
    ("admin_firstname", FieldRule::Path("admin.first_name")),
    ("admin_lastname", FieldRule::Path("admin.last_name")),
    ("admin_email", FieldRule::Path("admin.email")),
    ("admin_title", FieldRule::Computed(admin_title)),
    ("admin_phone", FieldRule::Computed(admin_phone)),
    ("tech_firstname", FieldRule::Path("tech.first_name")),
    ("tech_lastname", FieldRule::Path("tech.last_name")),
    ("tech_email", FieldRule::Path("tech.email")),
    ("tech_title", FieldRule::Computed(tech_title)),
    ("tech_phone", FieldRule::Computed(tech_phone)),
];

/// Builds the provider wire payload from a fully enriched order context.
#[must_use]
pub fn assemble_order(context: &Value) -> OrderData {
    let mut payload = OrderData::new();
    for (field, rule) in ORDER_FIELDS {
        let value = match rule {
            FieldRule::Path(path) => lookup_path(context, path).cloned().unwrap_or(Value::Null),
            FieldRule::Computed(compute) => compute(context),
        };
        payload.insert((*field).to_owned(), value);
    }
    payload
}

/// Term in months: twelve per ordered year, defaulting to one year when
/// the amount is absent or zero.
fn period_months(row: &Value) -> Value {
    let years = lookup_path(row, "amount")
        .and_then(value_to_i64)
        .filter(|years| *years != 0)
        .unwrap_or(1);
    Value::from(12 * years)
}

fn server_count(row: &Value) -> Value {
    match lookup_path(row, "server_count") {
        Some(count) if is_truthy(count) => count.clone(),
        _ => Value::from(-1),
    }
}

fn webserver_type(row: &Value) -> Value {
    match lookup_path(row, "webserver_type") {
        Some(kind) if is_truthy(kind) => kind.clone(),
        _ => Value::from("nginx"),
    }
}

fn admin_title(row: &Value) -> Value {
    contact_title(lookup_path(row, "admin"))
}

fn tech_title(row: &Value) -> Value {
    contact_title(lookup_path(row, "tech"))
}

/// The provider rejects orders without a salutation, so contacts that have
/// none are submitted as "Mr.".
fn contact_title(contact: Option<&Value>) -> Value {
    match contact.and_then(|c| c.get("title")) {
        Some(title) if is_truthy(title) => title.clone(),
        _ => Value::from("Mr."),
    }
}

fn admin_phone(row: &Value) -> Value {
    contact_phone(lookup_path(row, "admin.phone"))
}

fn tech_phone(row: &Value) -> Value {
    contact_phone(lookup_path(row, "tech.phone"))
}

fn contact_phone(phone: Option<&Value>) -> Value {
    let raw = phone.map(scalar_string).unwrap_or_default();
    Value::from(digits_only(&raw))
}

/// Resolves a dotted path against nested JSON objects.
pub(crate) fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |value, segment| value.get(segment))
}

/// Loose truthiness over JSON values: null, false, zero, the empty string,
/// `"0"` and empty collections all count as absent.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Renders a scalar JSON value as the string the provider expects.
pub(crate) fn scalar_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "term years are small integers even when sent as floats"
            )]
            n.as_f64().map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
