//! Provider command set.
//!
//! Every remote operation the bridge performs is one of these commands.
//! The enum carries the arguments for the call and knows the provider's
//! wire name for the operation, which is what shows up in the error
//! context when a call fails.

use serde_json::{Value, json};

/// One remote operation against the reseller API.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    /// Fetch the full product catalog.
    AllProducts,
    /// Fetch the full price list.
    AllProductPrices,
    /// Look up the status of a placed order.
    OrderStatus {
        /// Provider-side order identifier.
        remote_id: Value,
    },
    /// Ask the provider to generate a CSR. The provider takes the record
    /// twice, once as the certificate subject and once as the
    /// organization block; callers submit the same record for both.
    GenerateCsr {
        /// Certificate subject fields.
        subject: Value,
        /// Organization fields.
        organization: Value,
    },
    /// List the approver email addresses accepted for a domain.
    DomainEmails {
        /// Query record, e.g. `{"domain": "example.com"}`.
        query: Value,
    },
    /// Place a new certificate order.
    AddOrder {
        /// Assembled wire payload.
        payload: Value,
    },
    /// Place a renewal order.
    AddRenewOrder {
        /// Assembled wire payload.
        payload: Value,
    },
    /// Reissue an existing order.
    ReissueOrder {
        /// Provider-side order identifier.
        order_id: Value,
        /// Caller-supplied order record, forwarded untouched.
        order: Value,
    },
}

impl ProviderCommand {
    /// The provider's name for this operation.
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::AllProducts => "getAllProducts",
            Self::AllProductPrices => "getAllProductPrices",
            Self::OrderStatus { .. } => "getOrderStatus",
            Self::GenerateCsr { .. } => "generateCSR",
            Self::DomainEmails { .. } => "getDomainEmails",
            Self::AddOrder { .. } => "addSSLOrder",
            Self::AddRenewOrder { .. } => "addSSLRenewOrder",
            Self::ReissueOrder { .. } => "reIssueOrder",
        }
    }

    /// Positional arguments of the call, as the provider's client library
    /// would receive them.
    #[must_use]
    pub fn args(&self) -> Value {
        match self {
            Self::AllProducts | Self::AllProductPrices => json!([]),
            Self::OrderStatus { remote_id } => json!([remote_id]),
            Self::GenerateCsr { subject, organization } => json!([subject, organization]),
            Self::DomainEmails { query } => json!([query]),
            Self::AddOrder { payload } | Self::AddRenewOrder { payload } => json!([payload]),
            Self::ReissueOrder { order_id, order } => json!([order_id, order]),
        }
    }

    /// Error context recorded when this call fails.
    #[must_use]
    pub fn context(&self) -> Value {
        json!({ "command": self.wire_name(), "args": self.args() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(ProviderCommand::AllProducts.wire_name(), "getAllProducts");
        assert_eq!(ProviderCommand::AllProductPrices.wire_name(), "getAllProductPrices");
        let status = ProviderCommand::OrderStatus { remote_id: json!(9) };
        assert_eq!(status.wire_name(), "getOrderStatus");
        let reissue = ProviderCommand::ReissueOrder { order_id: json!(9), order: json!({}) };
        assert_eq!(reissue.wire_name(), "reIssueOrder");
    }

    #[test]
    fn test_context_carries_command_and_args() {
        let command = ProviderCommand::OrderStatus { remote_id: json!("123") };
        assert_eq!(
            command.context(),
            json!({"command": "getOrderStatus", "args": ["123"]})
        );
    }

    #[test]
    fn test_generate_csr_args_are_positional() {
        let record = json!({"csr_commonname": "example.com"});
        let command =
            ProviderCommand::GenerateCsr { subject: record.clone(), organization: record.clone() };
        assert_eq!(command.args(), json!([record, record]));
    }

    #[test]
    fn test_no_arg_commands_have_empty_args() {
        assert_eq!(ProviderCommand::AllProducts.args(), json!([]));
        assert_eq!(ProviderCommand::AllProductPrices.args(), json!([]));
    }
}
