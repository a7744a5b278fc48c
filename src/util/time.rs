//! Time formatting utilities.

use chrono::{SecondsFormat, Utc};
use std::time::Duration;

/// Current UTC time as an RFC3339 string with microsecond precision.
#[must_use]
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Duration as fractional seconds.
#[must_use]
pub fn seconds(duration: Duration) -> f64 {
    duration.as_secs_f64()
}
