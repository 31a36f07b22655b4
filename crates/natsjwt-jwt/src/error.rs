//! Error types for issuing and assembling NATS credentials.

use std::fmt;
use thiserror::Error;

use crate::keys::KeyKind;

/// Why the signing step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningFailure {
    /// The key could not produce a signature.
    SignFailure,
    /// The claim set failed validation or serialization.
    InvalidClaimData,
}

impl fmt::Display for SigningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningFailure::SignFailure => f.write_str("sign failure"),
            SigningFailure::InvalidClaimData => f.write_str("invalid claim data"),
        }
    }
}

/// Why a trust bundle could not be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyFailure {
    UnsupportedResolver,
    MalformedAccountToken,
}

impl fmt::Display for AssemblyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyFailure::UnsupportedResolver => f.write_str("unsupported resolver"),
            AssemblyFailure::MalformedAccountToken => f.write_str("malformed account token"),
        }
    }
}

/// Errors that can occur while minting, decoding or assembling credentials.
///
/// Every failure is a deterministic validation failure: retrying with the
/// same input reproduces it.
#[derive(Debug, Error)]
pub enum TrustError {
    /// A key of the wrong role was supplied.
    #[error("{field}: expected {expected} key, got {actual} key")]
    KeyTypeMismatch {
        field: String,
        expected: KeyKind,
        actual: KeyKind,
    },

    /// A structurally invalid field.
    #[error("invalid {field}: {reason}")]
    MalformedInput { field: String, reason: String },

    /// Ambiguous input that cannot be resolved without guessing.
    #[error("conflicting configuration for {field}: {reason}")]
    ConflictingConfiguration { field: String, reason: String },

    /// A token string could not be parsed or its signature did not verify.
    #[error("failed to decode token: {0}")]
    DecodingFailure(String),

    /// The signing pipeline failed.
    #[error("signing failed ({reason}): {detail}")]
    Signing {
        reason: SigningFailure,
        detail: String,
    },

    /// Bundle assembly failed.
    #[error("bundle assembly failed ({reason}): {detail}")]
    Assembly {
        reason: AssemblyFailure,
        detail: String,
    },

    /// A child token does not link to the given parent.
    #[error("broken trust chain at {field}: {reason}")]
    BrokenChain { field: String, reason: String },
}

impl TrustError {
    pub(crate) fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TrustError::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TrustError::ConflictingConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn broken_chain(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TrustError::BrokenChain {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_claim_data(err: TrustError) -> Self {
        TrustError::Signing {
            reason: SigningFailure::InvalidClaimData,
            detail: err.to_string(),
        }
    }

    /// The field or token the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            TrustError::KeyTypeMismatch { field, .. }
            | TrustError::MalformedInput { field, .. }
            | TrustError::ConflictingConfiguration { field, .. }
            | TrustError::BrokenChain { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(SigningFailure::SignFailure.to_string(), "sign failure");
        assert_eq!(
            SigningFailure::InvalidClaimData.to_string(),
            "invalid claim data"
        );
        assert_eq!(
            AssemblyFailure::UnsupportedResolver.to_string(),
            "unsupported resolver"
        );
        assert_eq!(
            AssemblyFailure::MalformedAccountToken.to_string(),
            "malformed account token"
        );
    }

    #[test]
    fn test_key_type_mismatch_message_names_field() {
        let err = TrustError::KeyTypeMismatch {
            field: "account.operator_seed".into(),
            expected: KeyKind::Operator,
            actual: KeyKind::User,
        };
        assert_eq!(
            err.to_string(),
            "account.operator_seed: expected operator key, got user key"
        );
        assert_eq!(err.field(), Some("account.operator_seed"));
    }
}
