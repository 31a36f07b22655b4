//! Token commands.
//!
//! `natsjwt token inspect` - Show a token's claims, and with `--account`
//!   the permissions a user ends up with.
//! `natsjwt token verify` - Verify a token's signature and optional parent link.

use anyhow::Context;
use chrono::{DateTime, Utc};
use natsjwt_jwt::{
    ClaimSet, KeyKind, Permissions, decode, decode_account, effective_permissions,
    inspect_token_unverified, verify_account_parent, verify_user_parent,
};

use super::read_token;

fn format_time(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| seconds.to_string())
}

fn print_summary(claims: &ClaimSet) {
    let now = Utc::now().timestamp();

    println!("  Type: {}", claims.kind());
    if !claims.name.is_empty() {
        println!("  Name: {}", claims.name);
    }
    println!("  Subject: {}", claims.subject);
    println!("  Issuer: {}", claims.issuer);
    println!("  Issued at: {}", format_time(claims.issued_at));
    if claims.expires == 0 {
        println!("  Expires: never");
    } else if claims.is_expired_at(now) {
        println!("  Expires: {} (expired)", format_time(claims.expires));
    } else {
        println!("  Expires: {}", format_time(claims.expires));
    }
    if !claims.is_active_at(now) && !claims.is_expired_at(now) {
        println!("  Not valid before: {}", format_time(claims.not_before));
    }
}

/// Permissions the server applies to `user`, falling back to the
/// defaults of the (verified) account token.
fn inherited_permissions(user: &ClaimSet, account: &str) -> anyhow::Result<Permissions> {
    let usr = user
        .as_user()
        .ok_or_else(|| anyhow::anyhow!("--account only applies to user tokens, got {}", user.kind()))?;
    let account = decode_account(read_token(account)?.as_str()).context("Invalid account token")?;
    let acct = account
        .as_account()
        .ok_or_else(|| anyhow::anyhow!("expected an account token, got {}", account.kind()))?;
    Ok(effective_permissions(acct, usr))
}

/// Inspect a token without verifying it.
pub fn inspect(token: &str, account: Option<&str>) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let info = inspect_token_unverified(token.as_str())?;

    println!("Token Information (signature not checked):");
    println!("  Algorithm: {}", info.algorithm);
    print_summary(&info.claims);
    println!();
    println!("{}", serde_json::to_string_pretty(&info.claims)?);

    if let Some(account) = account {
        let permissions = inherited_permissions(&info.claims, account)?;
        println!();
        println!("Effective permissions:");
        println!("{}", serde_json::to_string_pretty(&permissions)?);
    }

    Ok(())
}

/// Verify a token's signature and, with `parent`, its link to the parent.
pub fn verify(token: &str, parent: Option<&str>) -> anyhow::Result<()> {
    match check(token, parent) {
        Ok(claims) => {
            println!("✔ Token is valid");
            println!();
            println!("Token Details:");
            print_summary(&claims);
            Ok(())
        }
        Err(e) => {
            println!("✖ Token verification failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn check(token: &str, parent: Option<&str>) -> anyhow::Result<ClaimSet> {
    let claims = decode(read_token(token)?.as_str()).context("Invalid token")?;

    if let Some(parent) = parent {
        let parent = decode(read_token(parent)?.as_str()).context("Invalid parent token")?;
        match claims.kind() {
            KeyKind::Account => verify_account_parent(&parent, &claims)?,
            KeyKind::User => verify_user_parent(&parent, &claims)?,
            other => anyhow::bail!("a {} token has no parent to check", other),
        }
    }

    Ok(claims)
}
