//! Request/response payloads exposed over HTTP.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod health;
pub mod matches;
pub mod validation;

/// Format a timestamp for response payloads.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp from a request payload.
pub(crate) fn parse_rfc3339(value: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339).map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip() {
        let parsed = parse_rfc3339("2026-05-17T18:30:00Z").unwrap();
        assert_eq!(format_system_time(parsed), "2026-05-17T18:30:00Z");
    }

    #[test]
    fn garbage_timestamps_are_rejected() {
        assert!(parse_rfc3339("next tuesday").is_err());
        assert!(parse_rfc3339("").is_err());
    }
}
