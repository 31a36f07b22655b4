//! Temporal bounds shared by every entity kind.

use serde::{Deserialize, Serialize};

/// Issued-at, expiry and not-before, all in Unix seconds.
///
/// `issued_at` defaults to the epoch (0), never to the current time, so that
/// two issuances with identical options produce identical tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalOptions {
    /// Issued-at timestamp. Defaults to 0.
    pub issued_at: Option<i64>,

    /// Expiration timestamp. 0 or unset means the token never expires.
    pub expires: Option<i64>,

    /// Not-before timestamp. Defaults to `issued_at`.
    pub not_before: Option<i64>,
}

impl TemporalOptions {
    /// Resolve defaults, returning `(issued_at, expires, not_before)`.
    pub fn resolve(&self) -> (i64, i64, i64) {
        let issued_at = self.issued_at.unwrap_or(0);
        let expires = self.expires.unwrap_or(0);
        let not_before = self.not_before.unwrap_or(issued_at);
        (issued_at, expires, not_before)
    }
}
