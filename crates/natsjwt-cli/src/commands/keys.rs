//! Key management commands.
//!
//! `natsjwt keys generate` - Generate a new NKey pair.
//! `natsjwt keys public` - Print the public key of a seed.

use anyhow::Context;
use natsjwt_jwt::{KeyKind, KeyMaterial, public_key_from_seed};
use std::fs;
use std::path::PathBuf;

use super::inline_or_file;

/// Generate a new key pair of the given role.
pub fn generate(kind: KeyKind, output: Option<PathBuf>) -> anyhow::Result<()> {
    let key = KeyMaterial::generate(kind);
    let seed = key.seed()?;

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let seed_path = output_dir.join(format!("{}.seed", kind));
        let public_path = output_dir.join(format!("{}.pub", kind));

        fs::write(&seed_path, &seed)?;
        fs::write(&public_path, key.public_key())?;

        println!("✔ Generated {} key:", kind);
        println!("  Seed:       {}", seed_path.display());
        println!("  Public key: {}", public_path.display());
        println!();
        println!("⚠️  Keep the seed secure! Never commit it to version control.");
    } else {
        println!("Seed (keep secure!):");
        println!("{}", seed);
        println!();
        println!("Public key:");
        println!("{}", key.public_key());
        println!();
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}

/// Print the public key derived from a seed.
pub fn public(seed: &str) -> anyhow::Result<()> {
    println!("{}", derive_public(seed)?);
    Ok(())
}

fn derive_public(seed: &str) -> anyhow::Result<String> {
    let seed = inline_or_file(seed)?;
    public_key_from_seed(&seed).context("Failed to decode seed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_keys_to_files() {
        let dir = tempdir().unwrap();
        generate(KeyKind::Account, Some(dir.path().to_path_buf())).unwrap();

        let seed = fs::read_to_string(dir.path().join("account.seed")).unwrap();
        let public = fs::read_to_string(dir.path().join("account.pub")).unwrap();

        assert!(seed.starts_with("SA"));
        assert!(public.starts_with('A'));
        assert_eq!(public_key_from_seed(&seed).unwrap(), public);
    }

    #[test]
    fn test_public_from_inline_and_file() {
        let key = KeyMaterial::generate(KeyKind::User);
        let seed = key.seed().unwrap();
        assert_eq!(derive_public(&seed).unwrap(), key.public_key());

        let dir = tempdir().unwrap();
        let path = dir.path().join("user.seed");
        fs::write(&path, format!("{}\n", seed)).unwrap();
        assert_eq!(
            derive_public(path.to_str().unwrap()).unwrap(),
            key.public_key()
        );
    }

    #[test]
    fn test_public_rejects_garbage() {
        assert!(derive_public("not-a-seed").is_err());
    }
}
