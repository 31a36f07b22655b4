//! Server trust bundle: operator token, system account and resolver
//! preload map, built from already-signed tokens.
//!
//! Nothing here touches seeds. Account tokens are decoded and their
//! signatures checked against their own issuer using public material only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{AssemblyFailure, TrustError};
use crate::token::{SignedToken, decode_account};

/// How the server looks up account tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverKind {
    /// Accounts are preloaded into the server configuration.
    #[default]
    Memory,
    Full,
    Cache,
}

impl ResolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverKind::Memory => "MEMORY",
            ResolverKind::Full => "FULL",
            ResolverKind::Cache => "CACHE",
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolverKind {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MEMORY" => Ok(ResolverKind::Memory),
            "FULL" => Ok(ResolverKind::Full),
            "CACHE" => Ok(ResolverKind::Cache),
            other => Err(TrustError::Assembly {
                reason: AssemblyFailure::UnsupportedResolver,
                detail: format!("unknown resolver '{}'", other),
            }),
        }
    }
}

/// Everything a server needs to trust an operator's accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub operator: SignedToken,
    pub system_account_public_key: Option<String>,
    pub resolver: ResolverKind,
    /// Account public key to account token, in key order.
    pub preload: BTreeMap<String, SignedToken>,
    /// Account public keys whose earlier token was replaced by a later one.
    pub overwritten: Vec<String>,
}

/// Assemble a bundle from signed tokens.
///
/// The system account token, when given, is loaded first; account tokens
/// follow in order. A later token for the same account replaces the earlier
/// one and the account is listed in [`Bundle::overwritten`].
pub fn assemble(
    operator_token: &SignedToken,
    system_account_token: Option<&SignedToken>,
    account_tokens: &[SignedToken],
    resolver: ResolverKind,
) -> Result<Bundle, TrustError> {
    if resolver != ResolverKind::Memory {
        return Err(TrustError::Assembly {
            reason: AssemblyFailure::UnsupportedResolver,
            detail: format!("only MEMORY is supported, got {}", resolver),
        });
    }

    let mut bundle = Bundle {
        operator: operator_token.clone(),
        system_account_public_key: None,
        resolver,
        preload: BTreeMap::new(),
        overwritten: Vec::new(),
    };

    if let Some(token) = system_account_token {
        let subject = account_subject(token, "system_account_token")?;
        bundle.system_account_public_key = Some(subject.clone());
        bundle.insert(subject, token.clone());
    }

    for (i, token) in account_tokens.iter().enumerate() {
        let subject = account_subject(token, &format!("account_tokens[{}]", i))?;
        bundle.insert(subject, token.clone());
    }

    debug!(
        accounts = bundle.preload.len(),
        overwritten = bundle.overwritten.len(),
        "Assembled trust bundle"
    );
    Ok(bundle)
}

fn account_subject(token: &SignedToken, position: &str) -> Result<String, TrustError> {
    decode_account(token.as_str())
        .map(|claims| claims.subject)
        .map_err(|e| TrustError::Assembly {
            reason: AssemblyFailure::MalformedAccountToken,
            detail: format!("{}: {}", position, e),
        })
}

impl Bundle {
    fn insert(&mut self, subject: String, token: SignedToken) {
        if self.preload.insert(subject.clone(), token).is_some() {
            warn!(account = %subject, "Account appears more than once, last token wins");
            if !self.overwritten.contains(&subject) {
                self.overwritten.push(subject);
            }
        }
    }

    /// Render the server configuration fragment.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("operator: {}\n", self.operator));
        if let Some(pk) = &self.system_account_public_key {
            out.push_str(&format!("system_account: {}\n", pk));
        }
        out.push_str(&format!("resolver: {}\n", self.resolver));
        if !self.preload.is_empty() {
            out.push_str("resolver_preload: {\n");
            for (pk, token) in &self.preload {
                out.push_str(&format!("  {}: {}\n", pk, token));
            }
            out.push_str("}\n");
        }
        out
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
