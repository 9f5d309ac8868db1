pub mod auth;
pub mod badge;
pub mod board;
pub mod event;
pub mod listing;
pub mod member;
pub mod payment;

use chrono::{DateTime, Utc};

/// Parses an RFC 3339 timestamp from the command line
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("invalid timestamp {:?}: {}", s, err))
}
