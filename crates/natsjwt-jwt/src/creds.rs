//! The decorated `.creds` file clients use to authenticate: a user token
//! block followed by the user's seed block.

use std::fmt;

use crate::error::TrustError;
use crate::keys::{KeyKind, KeyMaterial};
use crate::token::{SignedToken, decode};

const SEED_BANNER: &str = "************************* IMPORTANT *************************
NKEY Seed printed below can be used to sign and prove identity.
NKEYs are sensitive and should be treated as secrets.";

const FOOTER: &str = "*************************************************************";

/// Render a user creds file from a user token and the user's seed.
pub fn render_user_creds(token: &SignedToken, seed: &str) -> Result<String, TrustError> {
    let seed = seed.trim();
    KeyMaterial::from_seed_as(seed, KeyKind::User, "creds.seed")?;

    Ok(format!(
        "-----BEGIN NATS USER JWT-----\n{token}\n------END NATS USER JWT------\n\n\
         {SEED_BANNER}\n\n\
         -----BEGIN USER NKEY SEED-----\n{seed}\n------END USER NKEY SEED------\n\n\
         {FOOTER}\n"
    ))
}

/// Token and seed extracted from a creds file.
#[derive(Clone, PartialEq, Eq)]
pub struct Creds {
    pub token: SignedToken,
    pub seed: String,
}

impl fmt::Debug for Creds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creds")
            .field("token", &self.token)
            .field("seed", &"<redacted>")
            .finish()
    }
}

/// Parse a creds file. The first decorated block is the token, the second
/// the seed; text outside the blocks is ignored.
pub fn parse_creds(text: &str) -> Result<Creds, TrustError> {
    let mut blocks = Vec::with_capacity(2);
    let mut lines = text.lines().map(str::trim);

    while let Some(line) = lines.next() {
        if !(line.starts_with("---") && line.contains("BEGIN")) {
            continue;
        }
        let content = lines
            .by_ref()
            .find(|l| !l.is_empty())
            .ok_or_else(|| TrustError::malformed("creds", format!("'{}' has no content", line)))?;
        let end = lines.by_ref().find(|l| !l.is_empty()).unwrap_or_default();
        if !(end.starts_with("---") && end.contains("END")) {
            return Err(TrustError::malformed(
                "creds",
                format!("'{}' is not closed", line),
            ));
        }
        blocks.push(content.to_string());
        if blocks.len() == 2 {
            break;
        }
    }

    let mut blocks = blocks.into_iter();
    match (blocks.next(), blocks.next()) {
        (Some(token), Some(seed)) => Ok(Creds {
            token: SignedToken::new(token),
            seed,
        }),
        _ => Err(TrustError::malformed(
            "creds",
            "expected a token block and a seed block",
        )),
    }
}

impl Creds {
    /// Check that the embedded token is `expected` and that the embedded
    /// seed belongs to the token's subject.
    pub fn check_consistency(&self, expected: &SignedToken) -> Result<(), TrustError> {
        if &self.token != expected {
            return Err(TrustError::malformed(
                "creds.jwt",
                "embedded token differs from the issued token",
            ));
        }
        self.check_seed_matches_token()
    }

    /// Check that the seed's public key is the token's subject.
    pub fn check_seed_matches_token(&self) -> Result<(), TrustError> {
        let claims = decode(self.token.as_str())?;
        let key = KeyMaterial::from_seed_as(&self.seed, KeyKind::User, "creds.seed")?;
        if key.public_key() != claims.subject {
            return Err(TrustError::malformed(
                "creds.seed",
                format!(
                    "seed belongs to {} but the token subject is {}",
                    key.public_key(),
                    claims.subject
                ),
            ));
        }
        Ok(())
    }
}
