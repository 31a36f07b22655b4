//! Deterministic token signing and decoding.
//!
//! A token is `header.payload.signature`, each segment base64url without
//! padding. The header is fixed, the payload is the canonical JSON of a
//! [`ClaimSet`], and the signature is Ed25519 over `header.payload`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::claims::{CLAIMS_VERSION, ClaimSet, EntityClaims};
use crate::error::{SigningFailure, TrustError};
use crate::keys::{KeyKind, KeyMaterial, verify_signature};

/// Token type in the header.
pub const TOKEN_TYPE: &str = "JWT";

/// Signature algorithm in the header.
pub const ALGORITHM_NKEY: &str = "ed25519-nkey";

/// Older algorithm name, accepted when decoding.
const ALGORITHM_LEGACY: &str = "ed25519";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    typ: String,
    alg: String,
}

/// A signed token string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    /// Wrap an existing token string without checking it.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SignedToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

/// Signs claim sets with one key, producing byte-identical output for
/// identical input.
pub struct DeterministicSigner<'a> {
    key: &'a KeyMaterial,
}

impl<'a> DeterministicSigner<'a> {
    pub fn new(key: &'a KeyMaterial) -> Self {
        Self { key }
    }

    /// Sign a claim set.
    ///
    /// The identifier is cleared, the issuer is set to the signer's public
    /// key and the format version is stamped before the claims are
    /// validated and serialized. `issued_at` is taken as given.
    pub fn sign(&self, mut claims: ClaimSet) -> Result<SignedToken, TrustError> {
        claims.id.clear();
        claims.issuer = self.key.public_key();
        claims.set_version(CLAIMS_VERSION);

        claims.validate().map_err(TrustError::invalid_claim_data)?;
        self.check_authority(&claims)?;

        let header = serde_json::to_vec(&Header {
            typ: TOKEN_TYPE.to_string(),
            alg: ALGORITHM_NKEY.to_string(),
        })
        .map_err(|e| signing_error(SigningFailure::InvalidClaimData, e))?;
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| signing_error(SigningFailure::InvalidClaimData, e))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.key.sign(signing_input.as_bytes())?;

        debug!(
            kind = %claims.kind(),
            subject = %claims.subject,
            issuer = %claims.issuer,
            "Signed token"
        );

        Ok(SignedToken(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature)
        )))
    }

    /// Operators sign operators and accounts; accounts sign users.
    fn check_authority(&self, claims: &ClaimSet) -> Result<(), TrustError> {
        let expected = match &claims.nats {
            EntityClaims::Operator(_) => KeyKind::Operator,
            EntityClaims::Account(_) => KeyKind::Operator,
            EntityClaims::User(_) => KeyKind::Account,
        };
        self.key.expect_kind(expected, "signer")
    }
}

fn signing_error(reason: SigningFailure, err: impl fmt::Display) -> TrustError {
    TrustError::Signing {
        reason,
        detail: err.to_string(),
    }
}

struct Segments<'t> {
    header: &'t str,
    payload: &'t str,
    signature: &'t str,
}

fn split(token: &str) -> Result<Segments<'_>, TrustError> {
    let mut parts = token.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok(Segments {
                header,
                payload,
                signature,
            })
        }
        _ => Err(TrustError::DecodingFailure(
            "expected three non-empty dot-separated segments".into(),
        )),
    }
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TrustError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TrustError::DecodingFailure(format!("{} is not base64url: {}", what, e)))
}

fn parse(token: &str) -> Result<(Segments<'_>, ClaimSet), TrustError> {
    let segments = split(token)?;

    let header: Header = serde_json::from_slice(&decode_segment(segments.header, "header")?)
        .map_err(|e| TrustError::DecodingFailure(format!("invalid header: {}", e)))?;
    if header.typ != TOKEN_TYPE {
        return Err(TrustError::DecodingFailure(format!(
            "unsupported token type '{}'",
            header.typ
        )));
    }
    if header.alg != ALGORITHM_NKEY && header.alg != ALGORITHM_LEGACY {
        return Err(TrustError::DecodingFailure(format!(
            "unsupported algorithm '{}'",
            header.alg
        )));
    }

    let claims: ClaimSet = serde_json::from_slice(&decode_segment(segments.payload, "payload")?)
        .map_err(|e| TrustError::DecodingFailure(format!("invalid claims: {}", e)))?;

    Ok((segments, claims))
}

/// Decode a token and verify its signature against its own issuer.
///
/// Only public material is needed. Whether the issuer is trusted is a
/// separate question; see [`crate::chain`].
pub fn decode(token: &str) -> Result<ClaimSet, TrustError> {
    let (segments, claims) = parse(token)?;
    if claims.issuer.is_empty() {
        return Err(TrustError::DecodingFailure("token has no issuer".into()));
    }

    let signature = decode_segment(segments.signature, "signature")?;
    let signing_input = format!("{}.{}", segments.header, segments.payload);
    verify_signature(&claims.issuer, signing_input.as_bytes(), &signature)?;

    Ok(claims)
}

/// Decode a token that must describe an account.
pub fn decode_account(token: &str) -> Result<ClaimSet, TrustError> {
    let claims = decode(token)?;
    if claims.kind() != KeyKind::Account {
        return Err(TrustError::DecodingFailure(format!(
            "expected an account token, got a {} token",
            claims.kind()
        )));
    }
    Ok(claims)
}

/// Summary of a token parsed without signature verification.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub algorithm: String,
    pub claims: ClaimSet,
}

/// Parse a token without checking its signature.
///
/// **Warning:** only for display. Never trust the result for authorization.
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo, TrustError> {
    let segments = split(token)?;
    let header: Header = serde_json::from_slice(&decode_segment(segments.header, "header")?)
        .map_err(|e| TrustError::DecodingFailure(format!("invalid header: {}", e)))?;
    let claims: ClaimSet = serde_json::from_slice(&decode_segment(segments.payload, "payload")?)
        .map_err(|e| TrustError::DecodingFailure(format!("invalid claims: {}", e)))?;

    Ok(TokenInfo {
        algorithm: header.alg,
        claims,
    })
}
