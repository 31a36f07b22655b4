//! Account token options.
//!
//! Shared by regular accounts and the system account. Every block is
//! optional; an absent block leaves the account at its defaults (unlimited
//! connection/account limits, JetStream disabled, no default permissions).

use serde::{Deserialize, Serialize};

use super::TemporalOptions;

/// Options for an account token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountOptions {
    /// Additional account signing keys (public keys starting with `A`).
    pub signing_keys: Vec<String>,

    #[serde(flatten)]
    pub temporal: TemporalOptions,

    pub description: Option<String>,

    /// Link to external information about the account.
    pub info_url: Option<String>,

    pub tags: Vec<String>,

    /// NATS connection limits.
    pub nats_limits: Option<NatsLimitsOptions>,

    /// Account-level limits.
    pub account_limits: Option<AccountLimitsOptions>,

    /// JetStream limit blocks. A block without a tier applies globally;
    /// a block with a tier (e.g. `R1`, `R3`) applies to that tier only.
    pub jetstream_limits: Vec<JetStreamLimitBlock>,

    /// Permissions applied to users that declare none of their own.
    pub default_permissions: Option<PermissionOptions>,

    /// Message trace configuration.
    pub trace: Option<TraceOptions>,

    /// Exports declared by the account.
    pub exports: Vec<ExportOptions>,
}

/// Subscription/data/payload limits. Unset values mean unlimited (-1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NatsLimitsOptions {
    pub subs: Option<i64>,
    pub data: Option<i64>,
    pub payload: Option<i64>,
}

/// Account-level limits. Unset counts mean unlimited (-1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountLimitsOptions {
    pub imports: Option<i64>,
    pub exports: Option<i64>,
    /// Allow wildcard exports. Defaults to true.
    pub wildcard_exports: Option<bool>,
    /// Reject bearer user tokens. Defaults to false.
    pub disallow_bearer: Option<bool>,
    pub conn: Option<i64>,
    pub leaf_node_conn: Option<i64>,
}

/// One JetStream limit block, global or scoped to a tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JetStreamLimitBlock {
    /// Replication tier (e.g. `R1`, `R3`). Unset or empty means global.
    pub tier: Option<String>,
    /// Memory storage in bytes. 0 disables memory storage.
    pub mem_storage: Option<i64>,
    /// Disk storage in bytes. 0 disables disk storage.
    pub disk_storage: Option<i64>,
    pub streams: Option<i64>,
    pub consumer: Option<i64>,
    pub max_ack_pending: Option<i64>,
    pub mem_max_stream_bytes: Option<i64>,
    pub disk_max_stream_bytes: Option<i64>,
    pub max_bytes_required: Option<bool>,
}

impl JetStreamLimitBlock {
    /// A block scoped to `tier` with every limit unset.
    pub fn for_tier(tier: impl Into<String>) -> Self {
        Self {
            tier: Some(tier.into()),
            ..Default::default()
        }
    }

    /// The tier label, or `None` for a global block.
    pub fn tier_label(&self) -> Option<&str> {
        self.tier.as_deref().filter(|t| !t.is_empty())
    }
}

/// Publish/subscribe allow and deny subject lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionOptions {
    pub pub_allow: Vec<String>,
    pub pub_deny: Vec<String>,
    pub sub_allow: Vec<String>,
    pub sub_deny: Vec<String>,
}

impl PermissionOptions {
    /// True when no subject list is populated.
    pub fn is_empty(&self) -> bool {
        self.pub_allow.is_empty()
            && self.pub_deny.is_empty()
            && self.sub_allow.is_empty()
            && self.sub_deny.is_empty()
    }
}

/// Message trace destination and sampling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Subject traces are delivered to. Without it no trace is configured.
    pub destination: Option<String>,
    /// Sampling percentage (0-100).
    pub sampling: Option<i64>,
}

/// Direction of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Unidirectional message flow.
    #[default]
    Stream,
    /// Request/reply.
    Service,
}

/// How many responses a service export may send per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    Singleton,
    Stream,
    Chunked,
}

/// One export declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub name: Option<String>,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: ExportKind,
    pub response_type: Option<ResponseKind>,
    /// Position of the importing account's public key in the subject.
    pub account_token_position: Option<u32>,
    pub advertise: bool,
    pub description: Option<String>,
    pub info_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tier_is_global() {
        let mut block = JetStreamLimitBlock::for_tier("R3");
        assert_eq!(block.tier_label(), Some("R3"));

        block.tier = Some(String::new());
        assert_eq!(block.tier_label(), None);

        block.tier = None;
        assert_eq!(block.tier_label(), None);
    }

    #[test]
    fn test_export_kind_parses_lowercase() {
        let export: ExportOptions =
            serde_yaml::from_str("subject: \"svc.>\"\ntype: service\nresponse_type: Singleton\n")
                .unwrap();
        assert_eq!(export.kind, ExportKind::Service);
        assert_eq!(export.response_type, Some(ResponseKind::Singleton));
        assert!(!export.advertise);
    }
}
