//! Field-level validation shared by the builders and `ClaimSet::validate`.

use chrono::{NaiveTime, Timelike};
use std::net::IpAddr;

use crate::error::TrustError;

/// Format of time-of-day strings in user time restrictions.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// A subject or subject pattern: non-empty, no whitespace, no empty tokens.
pub fn subject(value: &str, field: &str) -> Result<(), TrustError> {
    if value.is_empty() {
        return Err(TrustError::malformed(field, "subject must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(TrustError::malformed(
            field,
            format!("subject '{}' contains whitespace", value),
        ));
    }
    if value.split('.').any(str::is_empty) {
        return Err(TrustError::malformed(
            field,
            format!("subject '{}' has an empty token", value),
        ));
    }
    Ok(())
}

/// Validate every subject in a list, indexing the field path.
pub fn subjects<'a>(
    values: impl IntoIterator<Item = &'a String>,
    field: &str,
) -> Result<(), TrustError> {
    for (i, value) in values.into_iter().enumerate() {
        subject(value, &format!("{}[{}]", field, i))?;
    }
    Ok(())
}

/// A canonical CIDR block: `address/prefix` with no host bits set.
pub fn cidr(value: &str, field: &str) -> Result<(), TrustError> {
    let (addr, prefix) = value.split_once('/').ok_or_else(|| {
        TrustError::malformed(field, format!("'{}' is not in CIDR notation", value))
    })?;
    let addr: IpAddr = addr.parse().map_err(|_| {
        TrustError::malformed(field, format!("'{}' has an invalid address", value))
    })?;
    let prefix: u32 = prefix.parse().map_err(|_| {
        TrustError::malformed(field, format!("'{}' has an invalid prefix length", value))
    })?;

    let canonical = match addr {
        IpAddr::V4(v4) => {
            if prefix > 32 {
                return Err(TrustError::malformed(
                    field,
                    format!("'{}' prefix exceeds 32", value),
                ));
            }
            let bits = u32::from(v4);
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            bits & !mask == 0
        }
        IpAddr::V6(v6) => {
            if prefix > 128 {
                return Err(TrustError::malformed(
                    field,
                    format!("'{}' prefix exceeds 128", value),
                ));
            }
            let bits = u128::from(v6);
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            bits & !mask == 0
        }
    };

    if !canonical {
        return Err(TrustError::malformed(
            field,
            format!("'{}' has host bits set", value),
        ));
    }
    Ok(())
}

/// A time-of-day string in `HH:MM:SS` form.
pub fn time_of_day(value: &str, field: &str) -> Result<NaiveTime, TrustError> {
    let invalid = || {
        TrustError::malformed(
            field,
            format!("'{}' is not a time of day in HH:MM:SS form", value),
        )
    };
    let time = NaiveTime::parse_from_str(value, TIME_OF_DAY_FORMAT).map_err(|_| invalid())?;
    // chrono keeps second 60 as a leap second.
    if time.nanosecond() >= 1_000_000_000 {
        return Err(invalid());
    }
    Ok(time)
}

/// Parse a human duration (`"90s"`, `"1h 30m"`) into nanoseconds.
pub fn duration_nanos(value: &str, field: &str) -> Result<i64, TrustError> {
    let duration = humantime::parse_duration(value.trim())
        .map_err(|e| TrustError::malformed(field, format!("'{}': {}", value, e)))?;
    i64::try_from(duration.as_nanos())
        .map_err(|_| TrustError::malformed(field, format!("'{}' is too long", value)))
}

/// Trace sampling percentage.
pub fn sampling(value: i64, field: &str) -> Result<(), TrustError> {
    if !(0..=100).contains(&value) {
        return Err(TrustError::malformed(
            field,
            format!("sampling must be between 0 and 100, got {}", value),
        ));
    }
    Ok(())
}

/// Timezone name. Only the shape is checked; the server resolves it.
pub fn locale(value: &str, field: &str) -> Result<(), TrustError> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(TrustError::malformed(
            field,
            format!("'{}' is not a timezone name", value),
        ));
    }
    Ok(())
}

/// Operator service URL: `nats`, `tls`, `ws` or `wss` scheme with a host.
pub fn service_url(value: &str, field: &str) -> Result<(), TrustError> {
    let url = url::Url::parse(value)
        .map_err(|e| TrustError::malformed(field, format!("'{}' is not a URL: {}", value, e)))?;
    if !matches!(url.scheme(), "nats" | "tls" | "ws" | "wss") {
        return Err(TrustError::malformed(
            field,
            format!("'{}' must use nats, tls, ws or wss", value),
        ));
    }
    // Opaque hosts pass through percent signs unchecked.
    match url.host_str() {
        Some(host) if !host.is_empty() && !host.contains('%') => Ok(()),
        _ => Err(TrustError::malformed(
            field,
            format!("'{}' has no valid host", value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects() {
        subject("app.>", "s").unwrap();
        subject("$SYS.REQ.ACCOUNT.*.*", "s").unwrap();
        assert!(subject("", "s").is_err());
        assert!(subject("app events", "s").is_err());
        assert!(subject("app..events", "s").is_err());

        let list = vec!["ok".to_string(), "bad subject".to_string()];
        let err = subjects(&list, "user.permissions.pub_allow").unwrap_err();
        assert_eq!(err.field(), Some("user.permissions.pub_allow[1]"));
    }

    #[test]
    fn test_cidr_canonical() {
        cidr("10.0.0.0/8", "src").unwrap();
        cidr("192.168.1.7/32", "src").unwrap();
        cidr("0.0.0.0/0", "src").unwrap();
        cidr("2001:db8::/32", "src").unwrap();

        assert!(cidr("10.0.0.1/8", "src").is_err());
        assert!(cidr("10.0.0.0", "src").is_err());
        assert!(cidr("10.0.0.0/33", "src").is_err());
        assert!(cidr("not-an-ip/8", "src").is_err());
        assert!(cidr("2001:db8::1/32", "src").is_err());
    }

    #[test]
    fn test_time_of_day() {
        time_of_day("08:00:00", "t").unwrap();
        time_of_day("23:59:59", "t").unwrap();
        assert!(time_of_day("8am", "t").is_err());
        assert!(time_of_day("25:00:00", "t").is_err());
        assert!(time_of_day("08:00", "t").is_err());
    }

    #[test]
    fn test_time_of_day_rejects_leap_second() {
        let err = time_of_day("23:59:60", "user.times[0].end").unwrap_err();
        assert_eq!(err.field(), Some("user.times[0].end"));
    }

    #[test]
    fn test_duration_nanos() {
        assert_eq!(duration_nanos("90s", "ttl").unwrap(), 90_000_000_000);
        assert_eq!(duration_nanos("1m", "ttl").unwrap(), 60_000_000_000);
        assert!(duration_nanos("soon", "ttl").is_err());
    }

    #[test]
    fn test_sampling_range() {
        sampling(0, "s").unwrap();
        sampling(100, "s").unwrap();
        assert!(sampling(101, "s").is_err());
        assert!(sampling(-1, "s").is_err());
    }

    #[test]
    fn test_service_urls() {
        service_url("nats://localhost:4222", "u").unwrap();
        service_url("wss://example.com", "u").unwrap();
        assert!(service_url("http://example.com", "u").is_err());
        assert!(service_url("localhost:4222", "u").is_err());
    }

    #[test]
    fn test_service_urls_reject_malformed_hosts() {
        service_url("tls://nats.example.com:4443", "u").unwrap();
        service_url("nats://10.0.0.1:4222", "u").unwrap();
        service_url("nats://[::1]:4222", "u").unwrap();

        for bad in ["nats://a b", "nats://[::", "nats://:::/", "tls://%%%", "nats://", "nats:"] {
            assert!(service_url(bad, "u").is_err(), "{} should be rejected", bad);
        }
    }
}
