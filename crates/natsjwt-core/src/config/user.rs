//! User token options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ConfigError, NatsLimitsOptions, PermissionOptions, TemporalOptions};

/// Options for a user token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserOptions {
    /// Public key of the account this user belongs to. Required when the
    /// user is signed by one of the account's signing keys.
    pub issuer_account: Option<String>,

    #[serde(flatten)]
    pub temporal: TemporalOptions,

    pub permissions: Option<UserPermissionOptions>,

    pub limits: Option<NatsLimitsOptions>,

    /// Allow the token to be used without proving possession of the seed.
    pub bearer_token: bool,

    pub allowed_connection_types: Vec<ConnectionType>,

    /// Source networks in CIDR notation (e.g. `10.0.0.0/8`).
    pub source_networks: Vec<String>,

    /// Daily time windows during which connections are accepted.
    pub time_restrictions: Vec<TimeRangeOptions>,

    /// IANA timezone name for `time_restrictions`. Required when any
    /// time restriction is set.
    pub locale: Option<String>,

    pub tags: Vec<String>,
}

/// User permissions: subject lists plus response permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPermissionOptions {
    #[serde(flatten)]
    pub subjects: PermissionOptions,

    /// Maximum number of responses per request.
    pub resp_max_msgs: Option<i64>,

    /// How long the response permission stays valid (e.g. `"1m"`, `"90s"`).
    pub resp_ttl: Option<String>,
}

/// A daily time window, `HH:MM:SS` on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeOptions {
    pub start: String,
    pub end: String,
}

impl TimeRangeOptions {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Client connection types a user may connect with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Standard,
    Websocket,
    Leafnode,
    Mqtt,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Standard => "STANDARD",
            ConnectionType::Websocket => "WEBSOCKET",
            ConnectionType::Leafnode => "LEAFNODE",
            ConnectionType::Mqtt => "MQTT",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(ConnectionType::Standard),
            "WEBSOCKET" => Ok(ConnectionType::Websocket),
            "LEAFNODE" => Ok(ConnectionType::Leafnode),
            "MQTT" => Ok(ConnectionType::Mqtt),
            other => Err(ConfigError::Config(format!(
                "invalid connection type '{}': must be one of STANDARD, WEBSOCKET, LEAFNODE, MQTT",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_type_roundtrip() {
        for ct in [
            ConnectionType::Standard,
            ConnectionType::Websocket,
            ConnectionType::Leafnode,
            ConnectionType::Mqtt,
        ] {
            assert_eq!(ct.as_str().parse::<ConnectionType>().unwrap(), ct);
            assert_eq!(
                serde_yaml::to_string(&ct).unwrap().trim(),
                ct.as_str()
            );
        }
        assert!("TCP".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn test_user_permissions_flatten_subjects() {
        let perms: UserPermissionOptions = serde_yaml::from_str(
            "pub_allow: [\"app.>\"]\nsub_allow: [\"_INBOX.>\"]\nresp_max_msgs: 1\nresp_ttl: 90s\n",
        )
        .unwrap();
        assert_eq!(perms.subjects.pub_allow, vec!["app.>".to_string()]);
        assert_eq!(perms.subjects.sub_allow, vec!["_INBOX.>".to_string()]);
        assert_eq!(perms.resp_max_msgs, Some(1));
        assert_eq!(perms.resp_ttl.as_deref(), Some("90s"));
    }
}
