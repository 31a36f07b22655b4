//! NKey material for the trust hierarchy.
//!
//! Seeds and public keys carry their role in a fixed prefix: seeds start
//! with `S` followed by the role letter, public keys start with the role
//! letter alone.

use nkeys::{KeyPair, KeyPairType};
use std::fmt;

use crate::error::{SigningFailure, TrustError};

/// Role of a key in the trust hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Operator,
    Account,
    User,
    Server,
}

impl KeyKind {
    /// Role letter shared by seeds (second character) and public keys
    /// (first character).
    pub fn prefix(&self) -> char {
        match self {
            KeyKind::Operator => 'O',
            KeyKind::Account => 'A',
            KeyKind::User => 'U',
            KeyKind::Server => 'N',
        }
    }

    /// Seed prefix, e.g. `SO` for operators.
    pub fn seed_prefix(&self) -> String {
        format!("S{}", self.prefix())
    }

    fn from_prefix(c: char) -> Option<Self> {
        match c {
            'O' => Some(KeyKind::Operator),
            'A' => Some(KeyKind::Account),
            'U' => Some(KeyKind::User),
            'N' => Some(KeyKind::Server),
            _ => None,
        }
    }

    fn pair_type(&self) -> KeyPairType {
        match self {
            KeyKind::Operator => KeyPairType::Operator,
            KeyKind::Account => KeyPairType::Account,
            KeyKind::User => KeyPairType::User,
            KeyKind::Server => KeyPairType::Server,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Operator => f.write_str("operator"),
            KeyKind::Account => f.write_str("account"),
            KeyKind::User => f.write_str("user"),
            KeyKind::Server => f.write_str("server"),
        }
    }
}

impl std::str::FromStr for KeyKind {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "operator" => Ok(KeyKind::Operator),
            "account" => Ok(KeyKind::Account),
            "user" => Ok(KeyKind::User),
            "server" => Ok(KeyKind::Server),
            other => Err(TrustError::malformed(
                "kind",
                format!("unknown key kind '{}'", other),
            )),
        }
    }
}

/// A decoded NKey pair with a known role.
pub struct KeyMaterial {
    kind: KeyKind,
    inner: KeyPair,
}

impl KeyMaterial {
    /// Decode a seed. `field` names the input for error messages.
    pub fn from_seed(seed: &str, field: &str) -> Result<Self, TrustError> {
        let seed = seed.trim();
        let kind = seed_kind(seed).ok_or_else(|| {
            TrustError::malformed(
                field,
                "not an operator, account, user or server seed",
            )
        })?;
        let inner = KeyPair::from_seed(seed)
            .map_err(|e| TrustError::malformed(field, format!("invalid seed: {}", e)))?;
        Ok(Self { kind, inner })
    }

    /// Decode a seed and require a specific role.
    pub fn from_seed_as(seed: &str, expected: KeyKind, field: &str) -> Result<Self, TrustError> {
        let key = Self::from_seed(seed, field)?;
        key.expect_kind(expected, field)?;
        Ok(key)
    }

    /// Generate a new random key of the given role.
    pub fn generate(kind: KeyKind) -> Self {
        Self {
            kind,
            inner: KeyPair::new(kind.pair_type()),
        }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn public_key(&self) -> String {
        self.inner.public_key()
    }

    /// The encoded seed. Treat as a secret.
    pub fn seed(&self) -> Result<String, TrustError> {
        self.inner
            .seed()
            .map_err(|e| TrustError::malformed("seed", e.to_string()))
    }

    /// Sign raw bytes with the private half of the key.
    pub fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TrustError> {
        self.inner.sign(input).map_err(|e| TrustError::Signing {
            reason: SigningFailure::SignFailure,
            detail: e.to_string(),
        })
    }

    /// Fail with `KeyTypeMismatch` unless this key has the expected role.
    pub fn expect_kind(&self, expected: KeyKind, field: &str) -> Result<(), TrustError> {
        if self.kind != expected {
            return Err(TrustError::KeyTypeMismatch {
                field: field.to_string(),
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("kind", &self.kind)
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

fn seed_kind(seed: &str) -> Option<KeyKind> {
    let mut chars = seed.chars();
    if chars.next() != Some('S') {
        return None;
    }
    chars.next().and_then(KeyKind::from_prefix)
}

/// Derive the public key of a seed of any supported role.
pub fn public_key_from_seed(seed: &str) -> Result<String, TrustError> {
    Ok(KeyMaterial::from_seed(seed, "seed")?.public_key())
}

/// Role of a public key, validating its encoding.
pub fn public_key_kind(public_key: &str, field: &str) -> Result<KeyKind, TrustError> {
    let kind = public_key
        .chars()
        .next()
        .and_then(KeyKind::from_prefix)
        .ok_or_else(|| {
            TrustError::malformed(field, format!("'{}' is not a public key", public_key))
        })?;
    KeyPair::from_public_key(public_key).map_err(|e| {
        TrustError::malformed(field, format!("invalid public key '{}': {}", public_key, e))
    })?;
    Ok(kind)
}

/// Validate a public key and require a specific role.
pub fn expect_public_key(public_key: &str, expected: KeyKind, field: &str) -> Result<(), TrustError> {
    let actual = public_key_kind(public_key, field)?;
    if actual != expected {
        return Err(TrustError::KeyTypeMismatch {
            field: field.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Check an Ed25519 signature made by `public_key`.
pub(crate) fn verify_signature(
    public_key: &str,
    input: &[u8],
    signature: &[u8],
) -> Result<(), TrustError> {
    let key = KeyPair::from_public_key(public_key)
        .map_err(|e| TrustError::DecodingFailure(format!("invalid issuer key: {}", e)))?;
    key.verify(input, signature)
        .map_err(|_| TrustError::DecodingFailure("signature verification failed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_each_kind() {
        for kind in [
            KeyKind::Operator,
            KeyKind::Account,
            KeyKind::User,
            KeyKind::Server,
        ] {
            let key = KeyMaterial::generate(kind);
            assert_eq!(key.kind(), kind);
            assert!(key.public_key().starts_with(kind.prefix()));
            assert!(key.seed().unwrap().starts_with(&kind.seed_prefix()));
        }
    }

    #[test]
    fn test_seed_roundtrip_is_deterministic() {
        let key = KeyMaterial::generate(KeyKind::Account);
        let seed = key.seed().unwrap();

        let decoded = KeyMaterial::from_seed(&seed, "seed").unwrap();
        assert_eq!(decoded.public_key(), key.public_key());
        assert_eq!(public_key_from_seed(&seed).unwrap(), key.public_key());
    }

    #[test]
    fn test_role_mismatch_is_reported() {
        let user = KeyMaterial::generate(KeyKind::User);
        let err = KeyMaterial::from_seed_as(
            &user.seed().unwrap(),
            KeyKind::Account,
            "account.seed",
        )
        .unwrap_err();

        match err {
            TrustError::KeyTypeMismatch {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "account.seed");
                assert_eq!(expected, KeyKind::Account);
                assert_eq!(actual, KeyKind::User);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_garbage_seed_is_malformed() {
        let err = KeyMaterial::from_seed("SUNOTAREALSEED", "user.seed").unwrap_err();
        assert!(matches!(err, TrustError::MalformedInput { .. }));

        let err = KeyMaterial::from_seed("hello", "user.seed").unwrap_err();
        assert!(matches!(err, TrustError::MalformedInput { .. }));
    }

    #[test]
    fn test_public_key_roles() {
        let account = KeyMaterial::generate(KeyKind::Account);
        let pk = account.public_key();

        assert_eq!(public_key_kind(&pk, "pk").unwrap(), KeyKind::Account);
        expect_public_key(&pk, KeyKind::Account, "pk").unwrap();
        assert!(matches!(
            expect_public_key(&pk, KeyKind::Operator, "pk"),
            Err(TrustError::KeyTypeMismatch { .. })
        ));
        assert!(public_key_kind("AXXXX", "pk").is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = KeyMaterial::generate(KeyKind::Operator);
        let sig = key.sign(b"payload").unwrap();

        verify_signature(&key.public_key(), b"payload", &sig).unwrap();
        assert!(verify_signature(&key.public_key(), b"tampered", &sig).is_err());
    }

    #[test]
    fn test_debug_hides_seed() {
        let key = KeyMaterial::generate(KeyKind::User);
        let seed = key.seed().unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(&seed));
        assert!(debug.contains(&key.public_key()));
    }

    #[test]
    fn test_kind_parses_case_insensitively() {
        assert_eq!("Operator".parse::<KeyKind>().unwrap(), KeyKind::Operator);
        assert_eq!("server".parse::<KeyKind>().unwrap(), KeyKind::Server);
        assert!("cluster".parse::<KeyKind>().is_err());
    }
}
