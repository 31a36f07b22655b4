//! Operator token options.

use serde::{Deserialize, Serialize};

use super::TemporalOptions;

/// Options for an operator token.
///
/// Omitted fields keep empty/zero values: no signing keys, no URLs, no
/// system account and `strict_signing_key_usage = false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorOptions {
    /// Additional operator signing keys (public keys starting with `O`).
    pub signing_keys: Vec<String>,

    /// URL of the account server.
    pub account_server_url: Option<String>,

    /// Operator service URLs (e.g. `nats://host:4222`), order preserved.
    pub operator_service_urls: Vec<String>,

    /// Public key of the system account (starts with `A`).
    pub system_account: Option<String>,

    /// Require accounts to be signed by a signing key rather than the
    /// operator identity key.
    pub strict_signing_key_usage: bool,

    #[serde(flatten)]
    pub temporal: TemporalOptions,

    pub tags: Vec<String>,
}
