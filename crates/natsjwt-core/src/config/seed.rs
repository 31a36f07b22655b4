//! Where a seed comes from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::ConfigError;

/// Location of an NKey seed: inline, an environment variable, or a file.
///
/// Resolution order is environment variable, then file, then inline value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedSource {
    /// Seed given inline. Prefer `env` or `file` for anything committed.
    pub value: Option<String>,

    /// Environment variable containing the seed.
    pub env: Option<String>,

    /// File containing the seed. Relative paths resolve against the
    /// manifest's directory.
    pub file: Option<PathBuf>,
}

impl SeedSource {
    /// An inline seed.
    pub fn inline(seed: impl Into<String>) -> Self {
        Self {
            value: Some(seed.into()),
            ..Default::default()
        }
    }

    /// A seed read from an environment variable.
    pub fn from_env(var: impl Into<String>) -> Self {
        Self {
            env: Some(var.into()),
            ..Default::default()
        }
    }

    /// Resolve the seed text. `entity` names the owner for error messages.
    pub fn resolve(&self, base_dir: &Path, entity: &str) -> Result<String, ConfigError> {
        // Try environment variable first
        if let Some(env_var) = &self.env {
            if let Ok(seed) = std::env::var(env_var) {
                return Ok(seed.trim().to_string());
            }
        }

        // Try file path
        if let Some(path) = &self.file {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            if path.exists() {
                let seed = std::fs::read_to_string(&path)?;
                return Ok(seed.trim().to_string());
            }
        }

        if let Some(seed) = &self.value {
            return Ok(seed.trim().to_string());
        }

        Err(ConfigError::MissingSeed {
            entity: entity.to_string(),
        })
    }
}

impl fmt::Debug for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedSource")
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("env", &self.env)
            .field("file", &self.file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inline_seed_resolves() {
        let source = SeedSource::inline("SUAEXAMPLE\n");
        assert_eq!(source.resolve(Path::new("."), "u").unwrap(), "SUAEXAMPLE");
    }

    #[test]
    fn test_file_seed_resolves_relative_to_base_dir() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "SAFROMFILE").unwrap();

        let base = file.path().parent().unwrap();
        let name = file.path().file_name().unwrap();
        let source = SeedSource {
            file: Some(PathBuf::from(name)),
            ..Default::default()
        };
        assert_eq!(source.resolve(base, "acct").unwrap(), "SAFROMFILE");
    }

    #[test]
    fn test_env_seed_wins_over_inline() {
        // SAFETY: We're in a test and controlling the environment
        unsafe {
            std::env::set_var("NATSJWT_TEST_SEED_SOURCE", "SOFROMENV");
        }
        let source = SeedSource {
            value: Some("SOINLINE".into()),
            env: Some("NATSJWT_TEST_SEED_SOURCE".into()),
            file: None,
        };
        assert_eq!(source.resolve(Path::new("."), "op").unwrap(), "SOFROMENV");

        // SAFETY: Cleanup in test
        unsafe {
            std::env::remove_var("NATSJWT_TEST_SEED_SOURCE");
        }
    }

    #[test]
    fn test_missing_seed_names_entity() {
        let err = SeedSource::from_env("NATSJWT_TEST_UNSET_VAR")
            .resolve(Path::new("."), "billing")
            .unwrap_err();
        assert!(err.to_string().contains("billing"));
    }

    #[test]
    fn test_debug_redacts_inline_seed() {
        let debug = format!("{:?}", SeedSource::inline("SOSECRET"));
        assert!(!debug.contains("SOSECRET"));
    }
}
