//! Configuration types for natsjwt.
//!
//! This module provides the option types for each entity kind and the trust
//! manifest that combines them. A manifest can be loaded from YAML (default)
//! or TOML (`.toml` extension) and describes a full hierarchy:
//!
//! - **operator**: the root of trust, self-signed
//! - **system_account**: optional account that receives the system exports
//! - **accounts**: tenant accounts signed by the operator
//! - **users**: leaf credentials signed by an account or one of its signing keys

pub mod account;
pub mod operator;
pub mod seed;
pub mod temporal;
pub mod user;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub use account::{
    AccountLimitsOptions, AccountOptions, ExportKind, ExportOptions, JetStreamLimitBlock,
    NatsLimitsOptions, PermissionOptions, ResponseKind, TraceOptions,
};
pub use operator::OperatorOptions;
pub use seed::SeedSource;
pub use temporal::TemporalOptions;
pub use user::{ConnectionType, TimeRangeOptions, UserOptions, UserPermissionOptions};

/// A complete trust hierarchy, loaded from a manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// The operator (root of trust).
    pub operator: OperatorEntry,

    /// The system account, if any.
    #[serde(default)]
    pub system_account: Option<AccountEntry>,

    /// Regular accounts.
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,

    /// Users, each referencing an account by name.
    #[serde(default)]
    pub users: Vec<UserEntry>,

    /// Resolver kind for the generated server configuration.
    #[serde(default = "default_resolver")]
    pub resolver: String,

    /// Directory the manifest was loaded from; relative seed files resolve
    /// against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Operator entry in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub name: String,

    /// Operator identity seed (`SO...`). The operator token is self-signed
    /// with this key.
    pub seed: SeedSource,

    #[serde(flatten)]
    pub options: OperatorOptions,
}

/// Account entry in a manifest (also used for the system account).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntry {
    pub name: String,

    /// Account identity seed (`SA...`).
    pub seed: SeedSource,

    /// Operator signing key seed (`SO...`) used instead of the operator
    /// identity key.
    #[serde(default)]
    pub signer: Option<SeedSource>,

    #[serde(flatten)]
    pub options: AccountOptions,
}

/// User entry in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub name: String,

    /// User identity seed (`SU...`).
    pub seed: SeedSource,

    /// Name of the owning account (an `accounts` entry or the system account).
    pub account: String,

    /// Account signing key seed (`SA...`) used instead of the account
    /// identity key.
    #[serde(default)]
    pub signer: Option<SeedSource>,

    #[serde(flatten)]
    pub options: UserOptions,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("no seed could be resolved for '{entity}'")]
    MissingSeed { entity: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrustConfig {
    /// Load a manifest from a YAML or TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let mut config = if path.extension().map(|e| e == "toml").unwrap_or(false) {
            Self::from_toml(&content)?
        } else {
            Self::from_yaml(&content)?
        };

        config.base_dir = Some(
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
        );
        config.validate()?;
        Ok(config)
    }

    /// Parse a manifest from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Parse a manifest from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Directory relative seed files resolve against.
    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Check names and cross references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.operator.name.trim().is_empty() {
            return Err(ConfigError::Config("operator name must not be empty".into()));
        }

        let mut names = HashSet::new();
        for account in self.system_account.iter().chain(self.accounts.iter()) {
            if account.name.trim().is_empty() {
                return Err(ConfigError::Config("account name must not be empty".into()));
            }
            if !names.insert(account.name.as_str()) {
                return Err(ConfigError::Config(format!(
                    "duplicate account name '{}'",
                    account.name
                )));
            }
        }

        let mut user_names = HashSet::new();
        for user in &self.users {
            if user.name.trim().is_empty() {
                return Err(ConfigError::Config("user name must not be empty".into()));
            }
            if !user_names.insert((user.account.as_str(), user.name.as_str())) {
                return Err(ConfigError::Config(format!(
                    "duplicate user '{}' in account '{}'",
                    user.name, user.account
                )));
            }
            if !names.contains(user.account.as_str()) {
                return Err(ConfigError::Config(format!(
                    "user '{}' references unknown account '{}'",
                    user.name, user.account
                )));
            }
        }

        Ok(())
    }

    /// Find an account entry (including the system account) by name.
    pub fn get_account(&self, name: &str) -> Option<&AccountEntry> {
        self.system_account
            .iter()
            .chain(self.accounts.iter())
            .find(|a| a.name == name)
    }

    /// Whether `name` refers to the system account.
    pub fn is_system_account(&self, name: &str) -> bool {
        self.system_account
            .as_ref()
            .map(|s| s.name == name)
            .unwrap_or(false)
    }
}

fn default_resolver() -> String {
    "MEMORY".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
operator:
  name: acme
  seed:
    env: OPERATOR_SEED
accounts:
  - name: app
    seed:
      value: SAEXAMPLE
users:
  - name: alice
    account: app
    seed:
      value: SUEXAMPLE
"#;

    #[test]
    fn test_minimal_manifest_defaults() {
        let config = TrustConfig::from_yaml(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.resolver, "MEMORY");
        assert!(config.system_account.is_none());
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.users[0].account, "app");
        assert!(config.users[0].options.time_restrictions.is_empty());
        assert_eq!(config.base_dir(), Path::new("."));
    }

    #[test]
    fn test_dangling_account_reference_rejected() {
        let yaml = MINIMAL.replace("account: app", "account: billing");
        let config = TrustConfig::from_yaml(&yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn test_duplicate_account_names_rejected() {
        let yaml = format!(
            "{}  - name: app\n    seed:\n      value: SAOTHER\n",
            MINIMAL.split("users:").next().unwrap()
        );
        let config = TrustConfig::from_yaml(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_system_account_lookup() {
        let yaml = format!(
            "{}system_account:\n  name: SYS\n  seed:\n    value: SASYS\n",
            MINIMAL
        );
        let config = TrustConfig::from_yaml(&yaml).unwrap();
        config.validate().unwrap();
        assert!(config.is_system_account("SYS"));
        assert!(!config.is_system_account("app"));
        assert!(config.get_account("SYS").is_some());
    }
}
