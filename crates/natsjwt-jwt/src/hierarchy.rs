//! Construction rules for operator, account and user tokens.
//!
//! Each entity has a `*_claims` function that turns options into a
//! [`ClaimSet`] and a `build_*` function that checks key roles and signs
//! the result. Option errors are reported against the offending field
//! (`account.jetstream_limits[1]`, `user.time_restrictions[0].start`)
//! before anything is signed.

use natsjwt_core::{
    AccountOptions, ExportKind, ExportOptions, JetStreamLimitBlock, OperatorOptions,
    PermissionOptions, ResponseKind, TemporalOptions, UserOptions,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::claims::{
    AccountClaims, AccountLimits, ClaimSet, EntityClaims, Export, JetStreamLimits, MsgTrace,
    NatsLimits, OperatorClaims, Permission, Permissions, ResponsePermission, TimeRange,
    UserClaims,
};
use crate::error::TrustError;
use crate::keys::{KeyKind, KeyMaterial, expect_public_key};
use crate::token::{DeterministicSigner, SignedToken};
use crate::validate;

/// Subject of the system account's monitoring service export.
pub const SYSTEM_SERVICE_EXPORT_SUBJECT: &str = "$SYS.REQ.ACCOUNT.*.*";

/// Subject of the system account's monitoring stream export.
pub const SYSTEM_STREAM_EXPORT_SUBJECT: &str = "$SYS.ACCOUNT.*.>";

const SYSTEM_EXPORT_INFO_URL: &str = "https://docs.nats.io/nats-server/configuration/sys_accounts";

// ============================================================================
// Operator
// ============================================================================

/// Claims for an operator token.
pub fn operator_claims(
    name: &str,
    own: &KeyMaterial,
    options: &OperatorOptions,
) -> Result<ClaimSet, TrustError> {
    own.expect_kind(KeyKind::Operator, "operator.seed")?;
    let (iat, exp, nbf) = temporal(&options.temporal, "operator")?;

    let signing_keys = signing_keys(&options.signing_keys, KeyKind::Operator, "operator")?;

    let system_account = match &options.system_account {
        Some(pk) => {
            expect_public_key(pk, KeyKind::Account, "operator.system_account")?;
            pk.clone()
        }
        None => String::new(),
    };

    for (i, url) in options.operator_service_urls.iter().enumerate() {
        validate::service_url(url, &format!("operator.operator_service_urls[{}]", i))?;
    }

    let claims = OperatorClaims {
        signing_keys,
        account_server_url: options.account_server_url.clone().unwrap_or_default(),
        operator_service_urls: options.operator_service_urls.clone(),
        system_account,
        strict_signing_key_usage: options.strict_signing_key_usage,
        tags: options.tags.iter().cloned().collect(),
        ..Default::default()
    };

    Ok(ClaimSet::new(name, own.public_key(), EntityClaims::Operator(claims)).with_times(iat, exp, nbf))
}

/// Build and sign an operator token. The signer is the operator's own key
/// or one of its signing keys.
pub fn build_operator(
    name: &str,
    own: &KeyMaterial,
    signer: &KeyMaterial,
    options: &OperatorOptions,
) -> Result<SignedToken, TrustError> {
    signer.expect_kind(KeyKind::Operator, "operator.signer")?;
    let claims = operator_claims(name, own, options)?;
    DeterministicSigner::new(signer).sign(claims)
}

// ============================================================================
// Account
// ============================================================================

/// Claims for an account token.
pub fn account_claims(
    name: &str,
    own: &KeyMaterial,
    options: &AccountOptions,
) -> Result<ClaimSet, TrustError> {
    account_claims_at(name, own, options, "account")
}

fn account_claims_at(
    name: &str,
    own: &KeyMaterial,
    options: &AccountOptions,
    prefix: &str,
) -> Result<ClaimSet, TrustError> {
    own.expect_kind(KeyKind::Account, &format!("{}.seed", prefix))?;
    let (iat, exp, nbf) = temporal(&options.temporal, prefix)?;

    let mut claims = AccountClaims {
        signing_keys: signing_keys(&options.signing_keys, KeyKind::Account, prefix)?,
        description: options.description.clone().unwrap_or_default(),
        info_url: options.info_url.clone().unwrap_or_default(),
        tags: options.tags.iter().cloned().collect(),
        ..Default::default()
    };

    if let Some(limits) = &options.nats_limits {
        claims.limits.nats = NatsLimits {
            subs: limits.subs.unwrap_or(-1),
            data: limits.data.unwrap_or(-1),
            payload: limits.payload.unwrap_or(-1),
        };
    }

    if let Some(limits) = &options.account_limits {
        claims.limits.account = AccountLimits {
            imports: limits.imports.unwrap_or(-1),
            exports: limits.exports.unwrap_or(-1),
            wildcards: limits.wildcard_exports.unwrap_or(true),
            disallow_bearer: limits.disallow_bearer.unwrap_or(false),
            conn: limits.conn.unwrap_or(-1),
            leaf: limits.leaf_node_conn.unwrap_or(-1),
        };
    }

    let placement = place_jetstream_limits(&options.jetstream_limits).map_err(|e| match e {
        TrustError::ConflictingConfiguration { field, reason } => TrustError::conflict(
            format!("{}.{}", prefix, field),
            reason,
        ),
        other => other,
    })?;
    claims.limits.jetstream = placement.global;
    claims.limits.tiered_limits = placement.tiers;

    if let Some(perms) = &options.default_permissions {
        claims.default_permissions =
            permissions(perms, &format!("{}.default_permissions", prefix))?;
    }

    if let Some(trace) = &options.trace {
        if let Some(sampling) = trace.sampling {
            validate::sampling(sampling, &format!("{}.trace.sampling", prefix))?;
        }
        if let Some(dest) = &trace.destination {
            validate::subject(dest, &format!("{}.trace.destination", prefix))?;
            claims.trace = Some(MsgTrace {
                destination: dest.clone(),
                sampling: trace.sampling.unwrap_or(0),
            });
        }
    }

    for (i, export) in options.exports.iter().enumerate() {
        claims
            .exports
            .push(export_from(export, &format!("{}.exports[{}]", prefix, i))?);
    }

    Ok(ClaimSet::new(name, own.public_key(), EntityClaims::Account(claims)).with_times(iat, exp, nbf))
}

/// Build and sign an account token with an operator key.
pub fn build_account(
    name: &str,
    own: &KeyMaterial,
    signer: &KeyMaterial,
    options: &AccountOptions,
) -> Result<SignedToken, TrustError> {
    signer.expect_kind(KeyKind::Operator, "account.signer")?;
    let claims = account_claims(name, own, options)?;
    DeterministicSigner::new(signer).sign(claims)
}

/// Claims for the system account: an account whose exports always include
/// the monitoring service and stream exports.
pub fn system_account_claims(
    name: &str,
    own: &KeyMaterial,
    options: &AccountOptions,
) -> Result<ClaimSet, TrustError> {
    let mut claims = account_claims_at(name, own, options, "system_account")?;
    if let EntityClaims::Account(account) = &mut claims.nats {
        merge_system_exports(&mut account.exports);
    }
    Ok(claims)
}

/// Build and sign the system account token.
pub fn build_system_account(
    name: &str,
    own: &KeyMaterial,
    signer: &KeyMaterial,
    options: &AccountOptions,
) -> Result<SignedToken, TrustError> {
    signer.expect_kind(KeyKind::Operator, "system_account.signer")?;
    let claims = system_account_claims(name, own, options)?;
    DeterministicSigner::new(signer).sign(claims)
}

/// The two exports every system account carries.
pub fn system_exports() -> [Export; 2] {
    let mut services = Export::new(SYSTEM_SERVICE_EXPORT_SUBJECT, ExportKind::Service);
    services.name = "account-monitoring-services".into();
    services.response_type = Some(ResponseKind::Singleton);
    services.account_token_position = 4;
    services.description =
        "Request account specific monitoring services for: SUBSZ, CONNZ, LEAFZ, JSZ and INFO"
            .into();
    services.info_url = SYSTEM_EXPORT_INFO_URL.into();

    let mut streams = Export::new(SYSTEM_STREAM_EXPORT_SUBJECT, ExportKind::Stream);
    streams.name = "account-monitoring-streams".into();
    streams.account_token_position = 3;
    streams.description = "Account specific monitoring stream".into();
    streams.info_url = SYSTEM_EXPORT_INFO_URL.into();

    [services, streams]
}

/// Append each system export unless an export on the same subject exists.
pub fn merge_system_exports(exports: &mut Vec<Export>) {
    for export in system_exports() {
        if !exports.iter().any(|e| e.subject == export.subject) {
            exports.push(export);
        }
    }
}

/// Where each JetStream limit block ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JetStreamPlacement {
    /// Global record; all zero (disabled) when no unlabeled block exists.
    pub global: JetStreamLimits,
    pub tiers: BTreeMap<String, JetStreamLimits>,
    /// Tier labels that appeared more than once; the last block won.
    pub overwritten_tiers: Vec<String>,
}

/// Partition JetStream blocks into the global record and the tier map.
///
/// More than one unlabeled block is a conflict. A repeated tier label keeps
/// the last block and is reported in `overwritten_tiers`.
pub fn place_jetstream_limits(
    blocks: &[JetStreamLimitBlock],
) -> Result<JetStreamPlacement, TrustError> {
    let mut placement = JetStreamPlacement::default();
    let mut global_index: Option<usize> = None;

    for (i, block) in blocks.iter().enumerate() {
        let limits = jetstream_limits(block);
        match block.tier_label() {
            None => {
                if let Some(first) = global_index {
                    return Err(TrustError::conflict(
                        format!("jetstream_limits[{}]", i),
                        format!(
                            "block {} is also unlabeled; only one global block is allowed",
                            first
                        ),
                    ));
                }
                global_index = Some(i);
                placement.global = limits;
            }
            Some(tier) => {
                if placement.tiers.insert(tier.to_string(), limits).is_some() {
                    warn!(tier = %tier, index = i, "Duplicate JetStream tier, last block wins");
                    if !placement.overwritten_tiers.iter().any(|t| t == tier) {
                        placement.overwritten_tiers.push(tier.to_string());
                    }
                }
            }
        }
    }

    Ok(placement)
}

fn jetstream_limits(block: &JetStreamLimitBlock) -> JetStreamLimits {
    JetStreamLimits {
        mem_storage: block.mem_storage.unwrap_or(0),
        disk_storage: block.disk_storage.unwrap_or(0),
        streams: block.streams.unwrap_or(-1),
        consumer: block.consumer.unwrap_or(-1),
        max_ack_pending: block.max_ack_pending.unwrap_or(-1),
        mem_max_stream_bytes: block.mem_max_stream_bytes.unwrap_or(0),
        disk_max_stream_bytes: block.disk_max_stream_bytes.unwrap_or(0),
        max_bytes_required: block.max_bytes_required.unwrap_or(false),
    }
}

fn export_from(options: &ExportOptions, field: &str) -> Result<Export, TrustError> {
    validate::subject(&options.subject, &format!("{}.subject", field))?;
    if options.response_type.is_some() && options.kind != ExportKind::Service {
        return Err(TrustError::malformed(
            format!("{}.response_type", field),
            "response type is only valid on service exports",
        ));
    }

    Ok(Export {
        name: options.name.clone().unwrap_or_default(),
        subject: options.subject.clone(),
        kind: options.kind,
        response_type: options.response_type,
        account_token_position: options.account_token_position.unwrap_or(0),
        advertise: options.advertise,
        description: options.description.clone().unwrap_or_default(),
        info_url: options.info_url.clone().unwrap_or_default(),
    })
}

// ============================================================================
// User
// ============================================================================

/// Claims for a user token.
pub fn user_claims(
    name: &str,
    own: &KeyMaterial,
    options: &UserOptions,
) -> Result<ClaimSet, TrustError> {
    own.expect_kind(KeyKind::User, "user.seed")?;
    let (iat, exp, nbf) = temporal(&options.temporal, "user")?;

    let mut claims = UserClaims {
        bearer_token: options.bearer_token,
        allowed_connection_types: options.allowed_connection_types.iter().copied().collect(),
        tags: options.tags.iter().cloned().collect(),
        ..Default::default()
    };

    if let Some(account) = &options.issuer_account {
        expect_public_key(account, KeyKind::Account, "user.issuer_account")?;
        claims.issuer_account = account.clone();
    }

    if let Some(perms) = &options.permissions {
        claims.permissions = permissions(&perms.subjects, "user.permissions")?;
        if perms.resp_max_msgs.is_some() || perms.resp_ttl.is_some() {
            let ttl = match &perms.resp_ttl {
                Some(ttl) => validate::duration_nanos(ttl, "user.permissions.resp_ttl")?,
                None => 0,
            };
            claims.permissions.resp = Some(ResponsePermission {
                max: perms.resp_max_msgs.unwrap_or(0),
                ttl,
            });
        }
    }

    if let Some(limits) = &options.limits {
        claims.limits.nats = NatsLimits {
            subs: limits.subs.unwrap_or(-1),
            data: limits.data.unwrap_or(-1),
            payload: limits.payload.unwrap_or(-1),
        };
    }

    for (i, network) in options.source_networks.iter().enumerate() {
        validate::cidr(network, &format!("user.source_networks[{}]", i))?;
        claims.limits.src.insert(network.clone());
    }

    for (i, range) in options.time_restrictions.iter().enumerate() {
        validate::time_of_day(&range.start, &format!("user.time_restrictions[{}].start", i))?;
        validate::time_of_day(&range.end, &format!("user.time_restrictions[{}].end", i))?;
        claims.limits.times.push(TimeRange {
            start: range.start.clone(),
            end: range.end.clone(),
        });
    }

    match &options.locale {
        Some(locale) => {
            validate::locale(locale, "user.locale")?;
            claims.limits.times_location = locale.clone();
        }
        None if !options.time_restrictions.is_empty() => {
            return Err(TrustError::malformed(
                "user.locale",
                "a timezone is required when time_restrictions are set",
            ));
        }
        None => {}
    }

    Ok(ClaimSet::new(name, own.public_key(), EntityClaims::User(claims)).with_times(iat, exp, nbf))
}

/// Build and sign a user token with an account key or account signing key.
pub fn build_user(
    name: &str,
    own: &KeyMaterial,
    signer: &KeyMaterial,
    options: &UserOptions,
) -> Result<SignedToken, TrustError> {
    signer.expect_kind(KeyKind::Account, "user.signer")?;
    let claims = user_claims(name, own, options)?;
    DeterministicSigner::new(signer).sign(claims)
}

/// Permissions a user ends up with: its own when it declares any pub/sub
/// subjects, otherwise its account's defaults. The user's response
/// permission is kept either way.
pub fn effective_permissions(account: &AccountClaims, user: &UserClaims) -> Permissions {
    if !user.permissions.is_empty() {
        return user.permissions.clone();
    }
    Permissions {
        resp: user.permissions.resp,
        ..account.default_permissions.clone()
    }
}

// ============================================================================
// Shared
// ============================================================================

fn temporal(options: &TemporalOptions, prefix: &str) -> Result<(i64, i64, i64), TrustError> {
    let (iat, exp, nbf) = options.resolve();
    if exp != 0 && exp < nbf {
        return Err(TrustError::malformed(
            format!("{}.expires", prefix),
            format!("expiry {} is before not-before {}", exp, nbf),
        ));
    }
    Ok((iat, exp, nbf))
}

fn signing_keys(
    keys: &[String],
    kind: KeyKind,
    prefix: &str,
) -> Result<BTreeSet<String>, TrustError> {
    let mut set = BTreeSet::new();
    for (i, key) in keys.iter().enumerate() {
        expect_public_key(key, kind, &format!("{}.signing_keys[{}]", prefix, i))?;
        set.insert(key.clone());
    }
    Ok(set)
}

fn permissions(options: &PermissionOptions, field: &str) -> Result<Permissions, TrustError> {
    let publish = permission(&options.pub_allow, &options.pub_deny, &format!("{}.pub", field))?;
    let subscribe = permission(&options.sub_allow, &options.sub_deny, &format!("{}.sub", field))?;
    Ok(Permissions {
        publish,
        subscribe,
        resp: None,
    })
}

fn permission(allow: &[String], deny: &[String], field: &str) -> Result<Permission, TrustError> {
    validate::subjects(allow, &format!("{}_allow", field))?;
    validate::subjects(deny, &format!("{}_deny", field))?;
    Ok(Permission {
        allow: allow.iter().cloned().collect(),
        deny: deny.iter().cloned().collect(),
    })
}
