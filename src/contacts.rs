//! Contact resolution against the external contact store.
//!
//! Orders reference their admin, tech and org contacts by id. Before an
//! order can be assembled those references are resolved through the
//! [`ContactDirectory`] and the full records are attached to the order.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{Result, TaggedError},
    models::{Contact, OrderData},
    order::{is_truthy, scalar_string},
};

/// Contact reference fields required on every order, in the order they are
/// checked.
pub const CONTACT_TYPES: [&str; 3] = ["admin", "tech", "org"];

/// External contact store consumed by the bridge.
///
/// The store owns contact records; the bridge only reads them. One batched
/// lookup resolves all contacts of an order.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Fetches the contacts with the given ids, keyed by id.
    ///
    /// Ids absent from the store may simply be missing from the returned
    /// map; that is not an error at this boundary.
    ///
    /// # Errors
    ///
    /// Returns a [`TaggedError`] when the store itself fails.
    async fn search(&self, ids: &[String]) -> Result<HashMap<String, Contact>>;
}

/// Resolves the contact references of an order and attaches the records.
///
/// Checks `admin_id`, `tech_id` and `org_id` in that order and fails fast
/// on the first missing one, without calling the store. The surviving ids
/// are fetched in a single deduplicated batch; a store failure is wrapped
/// with the order as context while keeping the store's message. Resolved
/// records land under `order["admin"]`, `order["tech"]` and `order["org"]`;
/// an id the store did not return attaches as JSON null.
pub(crate) async fn resolve_order_contacts(
    order: &mut OrderData,
    directory: &dyn ContactDirectory,
) -> Result<()> {
    let mut wanted = Vec::with_capacity(CONTACT_TYPES.len());
    for contact_type in CONTACT_TYPES {
        let key = format!("{contact_type}_id");
        let id = order.get(&key).filter(|value| is_truthy(value));
        let Some(id) = id else {
            return Err(TaggedError::missing_field(Value::Object(order.clone()), &key));
        };
        wanted.push((contact_type, scalar_string(id)));
    }

    let mut ids: Vec<String> = Vec::with_capacity(wanted.len());
    for (_, id) in &wanted {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }

    let contacts = directory.search(&ids).await.map_err(|store_error| {
        TaggedError::upstream_store(Value::Object(order.clone()), store_error.message)
    })?;

    for (contact_type, id) in wanted {
        let record = contacts
            .get(&id)
            .and_then(|contact| serde_json::to_value(contact).ok())
            .unwrap_or(Value::Null);
        order.insert(contact_type.to_owned(), record);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    struct StubDirectory {
        contacts: HashMap<String, Contact>,
        failure: Option<TaggedError>,
        calls: AtomicUsize,
        last_ids: std::sync::Mutex<Vec<String>>,
    }

    impl StubDirectory {
        fn with_contacts(pairs: &[(&str, &str)]) -> Self {
            let contacts = pairs
                .iter()
                .map(|(id, first_name)| {
                    let contact = Contact {
                        first_name: (*first_name).to_owned(),
                        last_name: "Example".to_owned(),
                        email: format!("{first_name}@example.com"),
                        phone: "+1 555 0000".to_owned(),
                        ..Contact::default()
                    };
                    ((*id).to_owned(), contact)
                })
                .collect();
            Self {
                contacts,
                failure: None,
                calls: AtomicUsize::new(0),
                last_ids: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            let mut stub = Self::with_contacts(&[]);
            stub.failure = Some(TaggedError::upstream_store(json!({}), message));
            stub
        }
    }

    #[async_trait]
    impl ContactDirectory for StubDirectory {
        async fn search(&self, ids: &[String]) -> Result<HashMap<String, Contact>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_ids.lock().unwrap() = ids.to_vec();
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            Ok(self.contacts.clone())
        }
    }

    fn order(fields: Value) -> OrderData {
        fields.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_resolves_and_attaches_contacts() {
        let directory = StubDirectory::with_contacts(&[("1", "Ada"), ("2", "Charles")]);
        let mut row = order(json!({"admin_id": 1, "tech_id": 2, "org_id": 1}));

        resolve_order_contacts(&mut row, &directory).await.unwrap();

        assert_eq!(row["admin"]["first_name"], json!("Ada"));
        assert_eq!(row["tech"]["first_name"], json!("Charles"));
        assert_eq!(row["org"]["first_name"], json!("Ada"));
    }

    #[tokio::test]
    async fn test_batch_is_deduplicated() {
        let directory = StubDirectory::with_contacts(&[("1", "Ada"), ("2", "Charles")]);
        let mut row = order(json!({"admin_id": 1, "tech_id": 2, "org_id": 1}));

        resolve_order_contacts(&mut row, &directory).await.unwrap();

        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*directory.last_ids.lock().unwrap(), vec!["1".to_owned(), "2".to_owned()]);
    }

    #[tokio::test]
    async fn test_missing_tech_id_fails_before_store_call() {
        let directory = StubDirectory::with_contacts(&[("1", "Ada")]);
        let mut row = order(json!({"admin_id": 1, "tech_id": "", "org_id": 3}));

        let err = resolve_order_contacts(&mut row, &directory).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::MissingField);
        assert_eq!(err.message, "no data given");
        assert_eq!(err.detail, Some(json!({"field": "tech_id"})));
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_missing_id_wins() {
        let directory = StubDirectory::with_contacts(&[]);
        let mut row = order(json!({"tech_id": "", "org_id": ""}));

        let err = resolve_order_contacts(&mut row, &directory).await.unwrap_err();

        assert_eq!(err.detail, Some(json!({"field": "admin_id"})));
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped_with_order_context() {
        let directory = StubDirectory::failing("store unavailable");
        let mut row = order(json!({"admin_id": 1, "tech_id": 2, "org_id": 3}));

        let err = resolve_order_contacts(&mut row, &directory).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::UpstreamStore);
        assert_eq!(err.message, "store unavailable");
        assert_eq!(err.data["admin_id"], json!(1));
    }

    #[tokio::test]
    async fn test_unknown_id_attaches_null() {
        let directory = StubDirectory::with_contacts(&[("1", "Ada")]);
        let mut row = order(json!({"admin_id": 1, "tech_id": 99, "org_id": 1}));

        resolve_order_contacts(&mut row, &directory).await.unwrap();

        assert_eq!(row["tech"], Value::Null);
    }
}
