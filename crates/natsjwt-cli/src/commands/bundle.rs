//! `natsjwt bundle` - Assemble the server config from signed tokens.

use anyhow::Context;
use natsjwt_jwt::{Bundle, ResolverKind, assemble};
use std::fs;
use std::path::Path;

use super::read_token;

fn build(
    operator: &str,
    system_account: Option<&str>,
    accounts: &[String],
    resolver: &str,
) -> anyhow::Result<Bundle> {
    let resolver: ResolverKind = resolver.parse()?;
    let operator = read_token(operator).context("Failed to read operator token")?;
    let system_account = system_account
        .map(read_token)
        .transpose()
        .context("Failed to read system account token")?;
    let accounts = accounts
        .iter()
        .map(|a| read_token(a))
        .collect::<anyhow::Result<Vec<_>>>()
        .context("Failed to read account tokens")?;

    Ok(assemble(
        &operator,
        system_account.as_ref(),
        &accounts,
        resolver,
    )?)
}

/// Assemble and print (or write) the server config fragment.
pub fn run(
    operator: &str,
    system_account: Option<&str>,
    accounts: &[String],
    resolver: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let bundle = build(operator, system_account, accounts, resolver)?;
    for pk in &bundle.overwritten {
        eprintln!("⚠️  Account {} was given more than once; the last token was kept", pk);
    }

    match output {
        Some(path) => {
            fs::write(path, bundle.render())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✔ Wrote server config to {}", path.display());
            println!("  Preloaded accounts: {}", bundle.preload.len());
        }
        None => print!("{}", bundle.render()),
    }

    Ok(())
}
