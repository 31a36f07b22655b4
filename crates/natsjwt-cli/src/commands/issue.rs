//! `natsjwt issue` - Issue a whole trust hierarchy from a manifest.

use anyhow::{Context, bail};
use natsjwt_core::{AccountEntry, SeedSource, TrustConfig};
use natsjwt_jwt::{
    Bundle, KeyKind, KeyMaterial, ResolverKind, SignedToken, assemble, build_account,
    build_operator, build_system_account, build_user, render_user_creds,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// A signed user token and its creds file.
#[derive(Debug)]
pub struct IssuedUser {
    pub account: String,
    pub name: String,
    pub token: SignedToken,
    pub creds: String,
}

/// Everything produced from one manifest.
#[derive(Debug)]
pub struct Issued {
    pub operator: (String, SignedToken),
    pub system_account: Option<(String, SignedToken)>,
    pub accounts: Vec<(String, SignedToken)>,
    pub users: Vec<IssuedUser>,
    pub bundle: Bundle,
}

/// Load a manifest, issue it, and write or print the results.
pub fn run(config_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let config = TrustConfig::from_file(config_path)
        .with_context(|| format!("Failed to load manifest {}", config_path.display()))?;
    let issued = issue(&config)?;

    match output {
        Some(dir) => {
            write_all(&issued, dir)?;
            println!("✔ Issued trust hierarchy into {}", dir.display());
            println!("  Operator: {}", issued.operator.0);
            if let Some((name, _)) = &issued.system_account {
                println!("  System account: {}", name);
            }
            println!("  Accounts: {}", issued.accounts.len());
            println!("  Users: {}", issued.users.len());
        }
        None => print!("{}", issued.bundle.render()),
    }

    Ok(())
}

fn load_key(
    source: &SeedSource,
    config: &TrustConfig,
    kind: KeyKind,
    entity: &str,
) -> anyhow::Result<KeyMaterial> {
    let seed = source.resolve(config.base_dir(), entity)?;
    Ok(KeyMaterial::from_seed_as(&seed, kind, entity)?)
}

fn account_signer(
    entry: &AccountEntry,
    config: &TrustConfig,
) -> anyhow::Result<Option<KeyMaterial>> {
    entry
        .signer
        .as_ref()
        .map(|source| {
            load_key(
                source,
                config,
                KeyKind::Operator,
                &format!("{}.signer", entry.name),
            )
        })
        .transpose()
}

/// Issue every entity in the manifest and assemble the server bundle.
pub fn issue(config: &TrustConfig) -> anyhow::Result<Issued> {
    let resolver: ResolverKind = config.resolver.parse()?;

    let operator_key = load_key(&config.operator.seed, config, KeyKind::Operator, "operator.seed")?;

    // Decode every account key up front; users and the operator's
    // system_account reference them.
    let mut account_keys: HashMap<&str, KeyMaterial> = HashMap::new();
    for entry in config.system_account.iter().chain(config.accounts.iter()) {
        let key = load_key(
            &entry.seed,
            config,
            KeyKind::Account,
            &format!("{}.seed", entry.name),
        )?;
        account_keys.insert(entry.name.as_str(), key);
    }

    let mut operator_options = config.operator.options.clone();
    if operator_options.system_account.is_none() {
        if let Some(sys) = &config.system_account {
            operator_options.system_account = account_keys
                .get(sys.name.as_str())
                .map(|k| k.public_key());
        }
    }
    let operator_token = build_operator(
        &config.operator.name,
        &operator_key,
        &operator_key,
        &operator_options,
    )
    .with_context(|| format!("Failed to issue operator '{}'", config.operator.name))?;
    info!(operator = %config.operator.name, "Issued operator token");

    let mut system_account = None;
    if let Some(entry) = &config.system_account {
        let own = &account_keys[entry.name.as_str()];
        let signer = account_signer(entry, config)?;
        let token = build_system_account(
            &entry.name,
            own,
            signer.as_ref().unwrap_or(&operator_key),
            &entry.options,
        )
        .with_context(|| format!("Failed to issue system account '{}'", entry.name))?;
        info!(account = %entry.name, "Issued system account token");
        system_account = Some((entry.name.clone(), token));
    }

    let mut accounts = Vec::with_capacity(config.accounts.len());
    for entry in &config.accounts {
        let own = &account_keys[entry.name.as_str()];
        let signer = account_signer(entry, config)?;
        let token = build_account(
            &entry.name,
            own,
            signer.as_ref().unwrap_or(&operator_key),
            &entry.options,
        )
        .with_context(|| format!("Failed to issue account '{}'", entry.name))?;
        info!(account = %entry.name, "Issued account token");
        accounts.push((entry.name.clone(), token));
    }

    let mut users = Vec::with_capacity(config.users.len());
    for entry in &config.users {
        let Some(account_key) = account_keys.get(entry.account.as_str()) else {
            bail!(
                "user '{}' references unknown account '{}'",
                entry.name,
                entry.account
            );
        };
        let entity = format!("{}.{}", entry.account, entry.name);
        let own = load_key(&entry.seed, config, KeyKind::User, &format!("{}.seed", entity))?;

        let signer = match &entry.signer {
            Some(source) => Some(load_key(
                source,
                config,
                KeyKind::Account,
                &format!("{}.signer", entity),
            )?),
            None => None,
        };

        let mut options = entry.options.clone();
        if let Some(signer) = &signer {
            if signer.public_key() != account_key.public_key() && options.issuer_account.is_none() {
                options.issuer_account = Some(account_key.public_key());
            }
        }

        let token = build_user(
            &entry.name,
            &own,
            signer.as_ref().unwrap_or(account_key),
            &options,
        )
        .with_context(|| format!("Failed to issue user '{}'", entity))?;
        let creds = render_user_creds(&token, &own.seed()?)?;
        info!(account = %entry.account, user = %entry.name, "Issued user token");

        users.push(IssuedUser {
            account: entry.account.clone(),
            name: entry.name.clone(),
            token,
            creds,
        });
    }

    let account_tokens: Vec<SignedToken> = accounts.iter().map(|(_, t)| t.clone()).collect();
    let bundle = assemble(
        &operator_token,
        system_account.as_ref().map(|(_, t)| t),
        &account_tokens,
        resolver,
    )?;

    Ok(Issued {
        operator: (config.operator.name.clone(), operator_token),
        system_account,
        accounts,
        users,
        bundle,
    })
}

/// Write tokens, creds and the server config into `dir`.
pub fn write_all(issued: &Issued, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let write = |name: String, content: &str| -> anyhow::Result<()> {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    };

    let (name, token) = &issued.operator;
    write(format!("{}.jwt", name), token.as_str())?;
    for (name, token) in issued.system_account.iter().chain(issued.accounts.iter()) {
        write(format!("{}.jwt", name), token.as_str())?;
    }
    for user in &issued.users {
        write(format!("{}-{}.jwt", user.account, user.name), user.token.as_str())?;
        write(format!("{}-{}.creds", user.account, user.name), &user.creds)?;
    }
    write("server.conf".to_string(), &issued.bundle.render())?;

    Ok(())
}
