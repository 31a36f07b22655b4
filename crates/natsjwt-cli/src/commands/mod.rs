//! CLI command implementations for natsjwt.

pub mod bundle;
pub mod creds;
pub mod issue;
pub mod keys;
pub mod token;

use anyhow::Context;
use natsjwt_jwt::SignedToken;
use std::fs;
use std::path::Path;

/// Read a value given either inline or as a path to a file containing it.
pub(crate) fn inline_or_file(value: &str) -> anyhow::Result<String> {
    let path = Path::new(value);
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(content.trim().to_string());
    }
    Ok(value.trim().to_string())
}

/// Read a token given inline or as a path.
pub(crate) fn read_token(value: &str) -> anyhow::Result<SignedToken> {
    Ok(SignedToken::new(inline_or_file(value)?))
}
