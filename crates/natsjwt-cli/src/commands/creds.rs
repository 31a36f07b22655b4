//! `natsjwt creds check` - Check a creds file's seed against its token.

use anyhow::Context;
use natsjwt_jwt::{Creds, decode, parse_creds};
use std::fs;
use std::path::Path;

use super::read_token;

fn load(path: &Path, expected: Option<&str>) -> anyhow::Result<Creds> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read creds file {}", path.display()))?;
    let creds = parse_creds(&text)?;

    match expected {
        Some(token) => creds.check_consistency(&read_token(token)?)?,
        None => creds.check_seed_matches_token()?,
    }
    Ok(creds)
}

/// Check a creds file and print the user it authenticates.
pub fn check(path: &Path, expected: Option<&str>) -> anyhow::Result<()> {
    let creds = load(path, expected)?;
    let claims = decode(creds.token.as_str())?;

    println!("✔ Credentials are consistent");
    if !claims.name.is_empty() {
        println!("  User: {}", claims.name);
    }
    println!("  Public key: {}", claims.subject);
    println!("  Issuer: {}", claims.issuer);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use natsjwt_core::UserOptions;
    use natsjwt_jwt::{KeyKind, KeyMaterial, build_user, render_user_creds};
    use tempfile::tempdir;

    #[test]
    fn test_check_creds_file() {
        let account = KeyMaterial::generate(KeyKind::Account);
        let user = KeyMaterial::generate(KeyKind::User);
        let token = build_user("alice", &user, &account, &UserOptions::default()).unwrap();
        let text = render_user_creds(&token, &user.seed().unwrap()).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("alice.creds");
        fs::write(&path, text).unwrap();

        load(&path, None).unwrap();
        load(&path, Some(token.as_str())).unwrap();

        let other = build_user("bob", &user, &account, &UserOptions::default()).unwrap();
        assert!(load(&path, Some(other.as_str())).is_err());
    }
}
