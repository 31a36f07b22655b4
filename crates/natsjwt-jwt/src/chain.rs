//! Parent/child linkage checks between decoded tokens.

use crate::claims::ClaimSet;
use crate::error::TrustError;
use crate::token::{decode, decode_account};

/// Check that `account` was issued by `operator` (its identity key or one
/// of its signing keys).
pub fn verify_account_parent(operator: &ClaimSet, account: &ClaimSet) -> Result<(), TrustError> {
    let op = operator.as_operator().ok_or_else(|| {
        TrustError::broken_chain("operator", format!("expected an operator token, got {}", operator.kind()))
    })?;
    if account.as_account().is_none() {
        return Err(TrustError::broken_chain(
            "account",
            format!("expected an account token, got {}", account.kind()),
        ));
    }

    if account.issuer != operator.subject && !op.signing_keys.contains(&account.issuer) {
        return Err(TrustError::broken_chain(
            "account.iss",
            format!(
                "issuer {} is neither operator {} nor one of its signing keys",
                account.issuer, operator.subject
            ),
        ));
    }
    if op.strict_signing_key_usage && account.issuer == operator.subject {
        return Err(TrustError::broken_chain(
            "account.iss",
            "operator requires accounts to be signed by a signing key",
        ));
    }
    Ok(())
}

/// Check that `user` was issued by `account` and names it correctly.
pub fn verify_user_parent(account: &ClaimSet, user: &ClaimSet) -> Result<(), TrustError> {
    let acct = account.as_account().ok_or_else(|| {
        TrustError::broken_chain("account", format!("expected an account token, got {}", account.kind()))
    })?;
    let usr = user.as_user().ok_or_else(|| {
        TrustError::broken_chain("user", format!("expected a user token, got {}", user.kind()))
    })?;

    if !acct.is_signer(&account.subject, &user.issuer) {
        return Err(TrustError::broken_chain(
            "user.iss",
            format!(
                "issuer {} is neither account {} nor one of its signing keys",
                user.issuer, account.subject
            ),
        ));
    }

    if user.issuer == account.subject {
        if !usr.issuer_account.is_empty() && usr.issuer_account != account.subject {
            return Err(TrustError::broken_chain(
                "user.issuer_account",
                format!(
                    "names account {} but the token was signed by {}",
                    usr.issuer_account, account.subject
                ),
            ));
        }
    } else if usr.issuer_account != account.subject {
        return Err(TrustError::broken_chain(
            "user.issuer_account",
            format!(
                "a signing-key issued user must name account {}",
                account.subject
            ),
        ));
    }
    Ok(())
}

/// Decode an operator, account and optional user token and check every
/// link. Returns the decoded account claims.
pub fn verify_chain(
    operator_token: &str,
    account_token: &str,
    user_token: Option<&str>,
) -> Result<ClaimSet, TrustError> {
    let operator = decode(operator_token)?;
    let account = decode_account(account_token)?;
    verify_account_parent(&operator, &account)?;

    if let Some(token) = user_token {
        let user = decode(token)?;
        verify_user_parent(&account, &user)?;
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{build_account, build_operator, build_user};
    use crate::keys::{KeyKind, KeyMaterial};
    use natsjwt_core::{AccountOptions, OperatorOptions, UserOptions};

    struct Fixture {
        operator: KeyMaterial,
        account: KeyMaterial,
        account_signer: KeyMaterial,
        user: KeyMaterial,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                operator: KeyMaterial::generate(KeyKind::Operator),
                account: KeyMaterial::generate(KeyKind::Account),
                account_signer: KeyMaterial::generate(KeyKind::Account),
                user: KeyMaterial::generate(KeyKind::User),
            }
        }

        fn operator_token(&self) -> String {
            build_operator("op", &self.operator, &self.operator, &OperatorOptions::default())
                .unwrap()
                .into_string()
        }

        fn account_token(&self) -> String {
            let options = AccountOptions {
                signing_keys: vec![self.account_signer.public_key()],
                ..Default::default()
            };
            build_account("acme", &self.account, &self.operator, &options)
                .unwrap()
                .into_string()
        }
    }

    #[test]
    fn test_direct_chain_verifies() {
        let f = Fixture::new();
        let user = build_user("alice", &f.user, &f.account, &UserOptions::default()).unwrap();

        let account = verify_chain(&f.operator_token(), &f.account_token(), Some(user.as_str())).unwrap();
        assert_eq!(account.subject, f.account.public_key());
    }

    #[test]
    fn test_signing_key_user_needs_issuer_account() {
        let f = Fixture::new();

        let missing = build_user("bob", &f.user, &f.account_signer, &UserOptions::default()).unwrap();
        let err = verify_chain(&f.operator_token(), &f.account_token(), Some(missing.as_str()))
            .unwrap_err();
        assert_eq!(err.field(), Some("user.issuer_account"));

        let options = UserOptions {
            issuer_account: Some(f.account.public_key()),
            ..Default::default()
        };
        let named = build_user("bob", &f.user, &f.account_signer, &options).unwrap();
        verify_chain(&f.operator_token(), &f.account_token(), Some(named.as_str())).unwrap();
    }

    #[test]
    fn test_foreign_account_breaks_chain() {
        let f = Fixture::new();
        let stranger = KeyMaterial::generate(KeyKind::Account);
        let user = build_user("eve", &f.user, &stranger, &UserOptions::default()).unwrap();

        let err = verify_chain(&f.operator_token(), &f.account_token(), Some(user.as_str()))
            .unwrap_err();
        assert!(matches!(err, TrustError::BrokenChain { .. }));
        assert_eq!(err.field(), Some("user.iss"));
    }

    #[test]
    fn test_foreign_operator_breaks_chain() {
        let f = Fixture::new();
        let other = Fixture::new();

        let err = verify_chain(&other.operator_token(), &f.account_token(), None).unwrap_err();
        assert_eq!(err.field(), Some("account.iss"));
    }

    #[test]
    fn test_strict_operator_rejects_identity_signed_account() {
        let f = Fixture::new();
        let op_signer = KeyMaterial::generate(KeyKind::Operator);
        let options = OperatorOptions {
            signing_keys: vec![op_signer.public_key()],
            strict_signing_key_usage: true,
            ..Default::default()
        };
        let operator = build_operator("op", &f.operator, &f.operator, &options).unwrap();

        let err = verify_chain(operator.as_str(), &f.account_token(), None).unwrap_err();
        assert_eq!(err.field(), Some("account.iss"));

        let via_signer =
            build_account("acme", &f.account, &op_signer, &AccountOptions::default()).unwrap();
        verify_chain(operator.as_str(), via_signer.as_str(), None).unwrap();
    }

    #[test]
    fn test_directly_signed_user_must_not_name_other_account() {
        let f = Fixture::new();
        let other = KeyMaterial::generate(KeyKind::Account);
        let options = UserOptions {
            issuer_account: Some(other.public_key()),
            ..Default::default()
        };
        let user = build_user("mallory", &f.user, &f.account, &options).unwrap();

        let err = verify_chain(&f.operator_token(), &f.account_token(), Some(user.as_str()))
            .unwrap_err();
        assert_eq!(err.field(), Some("user.issuer_account"));
    }
}
