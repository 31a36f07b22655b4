//! Claim sets for operator, account and user tokens.
//!
//! The structs here are the wire model: serializing a [`ClaimSet`] with
//! `serde_json` yields the canonical payload of a signed token. Field order
//! is declaration order, sets are `BTreeSet` and maps are `BTreeMap`, so the
//! output is byte-stable. Zero and empty members are omitted, and decoding
//! a missing member yields zero, matching what the bus server expects.

use natsjwt_core::{ConnectionType, ExportKind, ResponseKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::TrustError;
use crate::keys::{KeyKind, expect_public_key};
use crate::validate;

/// Claim format version stamped on every token.
pub const CLAIMS_VERSION: u8 = 2;

/// Subject-independent header of every token plus the entity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Expiry in seconds since the epoch; 0 means never.
    #[serde(rename = "exp", default)]
    pub expires: i64,

    /// Token identifier. Always empty so output stays reproducible.
    #[serde(rename = "jti", default)]
    pub id: String,

    /// Issue time in seconds since the epoch; defaults to 0, never "now".
    #[serde(rename = "iat", default)]
    pub issued_at: i64,

    /// Public key of the signer. Filled in at signing time.
    #[serde(rename = "iss", default)]
    pub issuer: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "nbf", default)]
    pub not_before: i64,

    /// Public key of the entity the token describes.
    #[serde(rename = "sub")]
    pub subject: String,

    pub nats: EntityClaims,
}

/// The entity-specific payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityClaims {
    Operator(OperatorClaims),
    Account(AccountClaims),
    User(UserClaims),
}

impl ClaimSet {
    /// A claim set for `subject` with temporal fields at the epoch.
    pub fn new(name: impl Into<String>, subject: impl Into<String>, nats: EntityClaims) -> Self {
        Self {
            expires: 0,
            id: String::new(),
            issued_at: 0,
            issuer: String::new(),
            name: name.into(),
            not_before: 0,
            subject: subject.into(),
            nats,
        }
    }

    /// Set issue, expiry and not-before times.
    pub fn with_times(mut self, issued_at: i64, expires: i64, not_before: i64) -> Self {
        self.issued_at = issued_at;
        self.expires = expires;
        self.not_before = not_before;
        self
    }

    /// Role of the entity this claim set describes.
    pub fn kind(&self) -> KeyKind {
        self.nats.kind()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        match &self.nats {
            EntityClaims::Operator(c) => &c.tags,
            EntityClaims::Account(c) => &c.tags,
            EntityClaims::User(c) => &c.tags,
        }
    }

    pub fn version(&self) -> u8 {
        match &self.nats {
            EntityClaims::Operator(c) => c.version,
            EntityClaims::Account(c) => c.version,
            EntityClaims::User(c) => c.version,
        }
    }

    pub(crate) fn set_version(&mut self, version: u8) {
        match &mut self.nats {
            EntityClaims::Operator(c) => c.version = version,
            EntityClaims::Account(c) => c.version = version,
            EntityClaims::User(c) => c.version = version,
        }
    }

    pub fn as_operator(&self) -> Option<&OperatorClaims> {
        match &self.nats {
            EntityClaims::Operator(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_account(&self) -> Option<&AccountClaims> {
        match &self.nats {
            EntityClaims::Account(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserClaims> {
        match &self.nats {
            EntityClaims::User(c) => Some(c),
            _ => None,
        }
    }

    /// True once `now` has reached a non-zero expiry.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires != 0 && now >= self.expires
    }

    /// True when `now` is within `[nbf, exp)`.
    pub fn is_active_at(&self, now: i64) -> bool {
        now >= self.not_before && !self.is_expired_at(now)
    }

    /// Re-check every structured restriction carried by the claim set.
    pub fn validate(&self) -> Result<(), TrustError> {
        expect_public_key(&self.subject, self.kind(), "sub")?;
        if self.expires != 0 && self.expires < self.not_before {
            return Err(TrustError::malformed(
                "exp",
                format!(
                    "expiry {} is before not-before {}",
                    self.expires, self.not_before
                ),
            ));
        }

        match &self.nats {
            EntityClaims::Operator(c) => c.validate(),
            EntityClaims::Account(c) => c.validate(),
            EntityClaims::User(c) => c.validate(),
        }
    }
}

impl EntityClaims {
    pub fn kind(&self) -> KeyKind {
        match self {
            EntityClaims::Operator(_) => KeyKind::Operator,
            EntityClaims::Account(_) => KeyKind::Account,
            EntityClaims::User(_) => KeyKind::User,
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn signing_keys_of(keys: &BTreeSet<String>, kind: KeyKind, field: &str) -> Result<(), TrustError> {
    for (i, key) in keys.iter().enumerate() {
        expect_public_key(key, kind, &format!("{}[{}]", field, i))?;
    }
    Ok(())
}

// ============================================================================
// Operator
// ============================================================================

/// Payload of an operator token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorClaims {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub signing_keys: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_server_url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_service_urls: Vec<String>,

    /// Public key of the system account.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_account: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub strict_signing_key_usage: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub version: u8,
}

impl Default for OperatorClaims {
    fn default() -> Self {
        Self {
            signing_keys: BTreeSet::new(),
            account_server_url: String::new(),
            operator_service_urls: Vec::new(),
            system_account: String::new(),
            strict_signing_key_usage: false,
            tags: BTreeSet::new(),
            version: CLAIMS_VERSION,
        }
    }
}

impl OperatorClaims {
    fn validate(&self) -> Result<(), TrustError> {
        signing_keys_of(&self.signing_keys, KeyKind::Operator, "nats.signing_keys")?;
        if !self.system_account.is_empty() {
            expect_public_key(&self.system_account, KeyKind::Account, "nats.system_account")?;
        }
        for (i, url) in self.operator_service_urls.iter().enumerate() {
            validate::service_url(url, &format!("nats.operator_service_urls[{}]", i))?;
        }
        Ok(())
    }
}

// ============================================================================
// Limits
// ============================================================================

/// Subscription, data and payload limits. `-1` is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatsLimits {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub subs: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub data: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub payload: i64,
}

impl Default for NatsLimits {
    fn default() -> Self {
        Self {
            subs: -1,
            data: -1,
            payload: -1,
        }
    }
}

/// Account-wide limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLimits {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub imports: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub exports: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub wildcards: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disallow_bearer: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub conn: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub leaf: i64,
}

impl Default for AccountLimits {
    fn default() -> Self {
        Self {
            imports: -1,
            exports: -1,
            wildcards: true,
            disallow_bearer: false,
            conn: -1,
            leaf: -1,
        }
    }
}

/// One JetStream limit record. The default is all zero: JetStream disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JetStreamLimits {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub mem_storage: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub disk_storage: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub streams: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub consumer: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_ack_pending: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub mem_max_stream_bytes: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub disk_max_stream_bytes: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub max_bytes_required: bool,
}

impl JetStreamLimits {
    /// True when JetStream is enabled by this record.
    pub fn is_enabled(&self) -> bool {
        self.mem_storage != 0 || self.disk_storage != 0
    }
}

/// Everything under an account's `limits` member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorLimits {
    #[serde(flatten)]
    pub nats: NatsLimits,

    #[serde(flatten)]
    pub account: AccountLimits,

    /// Global JetStream limits.
    #[serde(flatten)]
    pub jetstream: JetStreamLimits,

    /// JetStream limits per replication tier.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tiered_limits: BTreeMap<String, JetStreamLimits>,
}

// ============================================================================
// Permissions
// ============================================================================

/// Allow and deny subject sets for one direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allow: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deny: BTreeSet<String>,
}

impl Permission {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }

    fn validate(&self, field: &str) -> Result<(), TrustError> {
        validate::subjects(&self.allow, &format!("{}.allow", field))?;
        validate::subjects(&self.deny, &format!("{}.deny", field))
    }
}

/// How many responses a requester may receive and for how long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePermission {
    #[serde(default)]
    pub max: i64,
    /// Time to live in nanoseconds.
    #[serde(default)]
    pub ttl: i64,
}

/// Publish and subscribe permissions plus optional response permission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(rename = "pub", default)]
    pub publish: Permission,

    #[serde(rename = "sub", default)]
    pub subscribe: Permission,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp: Option<ResponsePermission>,
}

impl Permissions {
    /// True when neither direction carries a subject.
    pub fn is_empty(&self) -> bool {
        self.publish.is_empty() && self.subscribe.is_empty()
    }

    fn validate(&self, field: &str) -> Result<(), TrustError> {
        self.publish.validate(&format!("{}.pub", field))?;
        self.subscribe.validate(&format!("{}.sub", field))?;
        if let Some(resp) = &self.resp {
            if resp.ttl < 0 {
                return Err(TrustError::malformed(
                    format!("{}.resp.ttl", field),
                    "ttl must not be negative",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Account
// ============================================================================

/// Message trace destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgTrace {
    #[serde(rename = "dest", default, skip_serializing_if = "String::is_empty")]
    pub destination: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub sampling: i64,
}

/// One export declaration on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub subject: String,

    #[serde(rename = "type")]
    pub kind: ExportKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseKind>,

    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub account_token_position: u32,

    #[serde(default, skip_serializing_if = "is_false")]
    pub advertise: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info_url: String,
}

impl Export {
    pub fn new(subject: impl Into<String>, kind: ExportKind) -> Self {
        Self {
            name: String::new(),
            subject: subject.into(),
            kind,
            response_type: None,
            account_token_position: 0,
            advertise: false,
            description: String::new(),
            info_url: String::new(),
        }
    }

    fn validate(&self, field: &str) -> Result<(), TrustError> {
        validate::subject(&self.subject, &format!("{}.subject", field))?;
        if self.response_type.is_some() && self.kind != ExportKind::Service {
            return Err(TrustError::malformed(
                format!("{}.response_type", field),
                "response type is only valid on service exports",
            ));
        }
        if self.account_token_position > 0 {
            let position = self.account_token_position as usize;
            match self.subject.split('.').nth(position - 1) {
                Some("*") => {}
                _ => {
                    return Err(TrustError::malformed(
                        format!("{}.account_token_position", field),
                        format!(
                            "token {} of '{}' is not a '*' wildcard",
                            position, self.subject
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Payload of an account token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountClaims {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<Export>,

    #[serde(default)]
    pub limits: OperatorLimits,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub signing_keys: BTreeSet<String>,

    /// Permissions applied to users that declare none of their own.
    #[serde(default)]
    pub default_permissions: Permissions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<MsgTrace>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info_url: String,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub version: u8,
}

impl Default for AccountClaims {
    fn default() -> Self {
        Self {
            exports: Vec::new(),
            limits: OperatorLimits::default(),
            signing_keys: BTreeSet::new(),
            default_permissions: Permissions::default(),
            trace: None,
            description: String::new(),
            info_url: String::new(),
            tags: BTreeSet::new(),
            version: CLAIMS_VERSION,
        }
    }
}

impl AccountClaims {
    /// Whether `key` may sign users of this account (the account key
    /// itself or a declared signing key).
    pub fn is_signer(&self, account_public_key: &str, key: &str) -> bool {
        key == account_public_key || self.signing_keys.contains(key)
    }

    fn validate(&self) -> Result<(), TrustError> {
        signing_keys_of(&self.signing_keys, KeyKind::Account, "nats.signing_keys")?;
        for (i, export) in self.exports.iter().enumerate() {
            export.validate(&format!("nats.exports[{}]", i))?;
        }
        for tier in self.limits.tiered_limits.keys() {
            if tier.is_empty() {
                return Err(TrustError::malformed(
                    "nats.limits.tiered_limits",
                    "tier name must not be empty",
                ));
            }
        }
        self.default_permissions
            .validate("nats.default_permissions")?;
        if let Some(trace) = &self.trace {
            validate::subject(&trace.destination, "nats.trace.dest")?;
            validate::sampling(trace.sampling, "nats.trace.sampling")?;
        }
        Ok(())
    }
}

// ============================================================================
// User
// ============================================================================

/// A daily time window, `HH:MM:SS` on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Network, time and connection-count restrictions on a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLimits {
    /// Allowed source networks, serialized as one comma-joined string.
    #[serde(
        default,
        skip_serializing_if = "BTreeSet::is_empty",
        with = "cidr_list"
    )]
    pub src: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub times: Vec<TimeRange>,

    /// Timezone for `times`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub times_location: String,

    #[serde(flatten)]
    pub nats: NatsLimits,
}

impl Default for UserLimits {
    fn default() -> Self {
        Self {
            src: BTreeSet::new(),
            times: Vec::new(),
            times_location: String::new(),
            nats: NatsLimits::default(),
        }
    }
}

/// Payload of a user token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(flatten)]
    pub permissions: Permissions,

    #[serde(flatten)]
    pub limits: UserLimits,

    #[serde(default, skip_serializing_if = "is_false")]
    pub bearer_token: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allowed_connection_types: BTreeSet<ConnectionType>,

    /// Account public key, set when a signing key issued the token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer_account: String,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub version: u8,
}

impl Default for UserClaims {
    fn default() -> Self {
        Self {
            permissions: Permissions::default(),
            limits: UserLimits::default(),
            bearer_token: false,
            allowed_connection_types: BTreeSet::new(),
            issuer_account: String::new(),
            tags: BTreeSet::new(),
            version: CLAIMS_VERSION,
        }
    }
}

impl UserClaims {
    fn validate(&self) -> Result<(), TrustError> {
        if !self.issuer_account.is_empty() {
            expect_public_key(&self.issuer_account, KeyKind::Account, "nats.issuer_account")?;
        }
        self.permissions.validate("nats")?;
        for cidr in &self.limits.src {
            validate::cidr(cidr, "nats.src")?;
        }
        for (i, range) in self.limits.times.iter().enumerate() {
            validate::time_of_day(&range.start, &format!("nats.times[{}].start", i))?;
            validate::time_of_day(&range.end, &format!("nats.times[{}].end", i))?;
        }
        if !self.limits.times.is_empty() {
            if self.limits.times_location.is_empty() {
                return Err(TrustError::malformed(
                    "nats.times_location",
                    "required when time restrictions are set",
                ));
            }
            validate::locale(&self.limits.times_location, "nats.times_location")?;
        }
        Ok(())
    }
}

/// `src` is a comma-joined string on the wire; a JSON array is accepted
/// when decoding.
mod cidr_list {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeSet;

    pub fn serialize<S: Serializer>(set: &BTreeSet<String>, s: S) -> Result<S::Ok, S::Error> {
        let joined = set.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        s.serialize_str(&joined)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Joined(String),
        List(Vec<String>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
        let items = match Repr::deserialize(d)? {
            Repr::Joined(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
            Repr::List(v) => v,
        };
        Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyMaterial;
    use serde_json::json;

    fn user_claims_for(user: &KeyMaterial) -> ClaimSet {
        ClaimSet::new("alice", user.public_key(), EntityClaims::User(UserClaims::default()))
    }

    #[test]
    fn test_account_defaults_on_the_wire() {
        let account = KeyMaterial::generate(KeyKind::Account);
        let claims = ClaimSet::new(
            "acme",
            account.public_key(),
            EntityClaims::Account(AccountClaims::default()),
        );
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["jti"], json!(""));
        assert_eq!(value["iat"], json!(0));
        assert_eq!(value["exp"], json!(0));
        assert_eq!(value["nats"]["type"], json!("account"));
        assert_eq!(value["nats"]["version"], json!(2));

        let limits = &value["nats"]["limits"];
        assert_eq!(limits["subs"], json!(-1));
        assert_eq!(limits["conn"], json!(-1));
        assert_eq!(limits["wildcards"], json!(true));
        assert!(limits.get("mem_storage").is_none());
        assert!(limits.get("tiered_limits").is_none());
        assert_eq!(
            value["nats"]["default_permissions"],
            json!({"pub": {}, "sub": {}})
        );
    }

    #[test]
    fn test_header_field_order_is_canonical() {
        let user = KeyMaterial::generate(KeyKind::User);
        let text = serde_json::to_string(&user_claims_for(&user)).unwrap();

        let order = ["\"exp\"", "\"jti\"", "\"iat\"", "\"iss\"", "\"name\"", "\"nbf\"", "\"sub\"", "\"nats\""];
        let positions: Vec<usize> = order.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }

    #[test]
    fn test_src_is_comma_joined() {
        let user = KeyMaterial::generate(KeyKind::User);
        let mut claims = UserClaims::default();
        claims.limits.src.insert("192.168.0.0/16".into());
        claims.limits.src.insert("10.0.0.0/8".into());

        let set = ClaimSet::new("u", user.public_key(), EntityClaims::User(claims));
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["nats"]["src"], json!("10.0.0.0/8,192.168.0.0/16"));

        let decoded: ClaimSet = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn test_src_accepts_array_when_decoding() {
        let user = KeyMaterial::generate(KeyKind::User);
        let value = json!({
            "sub": user.public_key(),
            "nats": {"type": "user", "version": 2, "src": ["10.0.0.0/8"]}
        });
        let decoded: ClaimSet = serde_json::from_value(value).unwrap();
        assert!(decoded.as_user().unwrap().limits.src.contains("10.0.0.0/8"));
    }

    #[test]
    fn test_missing_limits_decode_as_zero() {
        let account = KeyMaterial::generate(KeyKind::Account);
        let value = json!({
            "sub": account.public_key(),
            "nats": {"type": "account", "version": 2, "limits": {"subs": 10}}
        });
        let decoded: ClaimSet = serde_json::from_value(value).unwrap();
        let limits = &decoded.as_account().unwrap().limits;
        assert_eq!(limits.nats.subs, 10);
        assert_eq!(limits.nats.data, 0);
        assert!(!limits.account.wildcards);
    }

    #[test]
    fn test_validate_rejects_host_bits() {
        let user = KeyMaterial::generate(KeyKind::User);
        let mut claims = UserClaims::default();
        claims.limits.src.insert("10.0.0.1/8".into());
        let set = ClaimSet::new("u", user.public_key(), EntityClaims::User(claims));

        let err = set.validate().unwrap_err();
        assert_eq!(err.field(), Some("nats.src"));
    }

    #[test]
    fn test_validate_requires_locale_with_times() {
        let user = KeyMaterial::generate(KeyKind::User);
        let mut claims = UserClaims::default();
        claims.limits.times.push(TimeRange {
            start: "08:00:00".into(),
            end: "17:00:00".into(),
        });
        let mut set = ClaimSet::new("u", user.public_key(), EntityClaims::User(claims));
        assert!(set.validate().is_err());

        if let EntityClaims::User(c) = &mut set.nats {
            c.limits.times_location = "Europe/Berlin".into();
        }
        set.validate().unwrap();
    }

    #[test]
    fn test_validate_subject_role() {
        let account = KeyMaterial::generate(KeyKind::Account);
        let set = ClaimSet::new(
            "wrong",
            account.public_key(),
            EntityClaims::User(UserClaims::default()),
        );
        assert!(matches!(
            set.validate(),
            Err(TrustError::KeyTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_export_token_position_must_point_at_wildcard() {
        let mut export = Export::new("svc.*.req", ExportKind::Service);
        export.account_token_position = 2;
        export.validate("e").unwrap();

        export.account_token_position = 3;
        assert!(export.validate("e").is_err());
    }

    #[test]
    fn test_expiry_helpers() {
        let user = KeyMaterial::generate(KeyKind::User);
        let set = user_claims_for(&user).with_times(100, 200, 150);

        assert!(!set.is_active_at(120));
        assert!(set.is_active_at(150));
        assert!(!set.is_expired_at(199));
        assert!(set.is_expired_at(200));
        assert!(!set.is_active_at(250));

        let forever = user_claims_for(&user);
        assert!(!forever.is_expired_at(i64::MAX));
    }
}
