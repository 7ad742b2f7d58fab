//! Interval-aware staleness classification.
//!
//! A sensor is `missing` once nothing arrived for two full sampling
//! cycles plus a fixed grace period: one missed cycle plus network
//! jitter must not flag a healthy sensor. Operators rely on this
//! exact policy; the multiplier and grace constant are part of the
//! contract.

use time::OffsetDateTime;

use crate::models::Connectivity;

/// Assumed sampling interval when none is configured.
pub const DEFAULT_INTERVAL_SECS: u32 = 60;

/// Fixed allowance for network jitter on top of two sampling cycles.
pub const GRACE_PERIOD_MS: i64 = 10_000;

/// Bounds accepted for a configured sampling interval.
pub const MIN_INTERVAL_SECS: u32 = 10;
pub const MAX_INTERVAL_SECS: u32 = 300;

/// Classify a sensor channel from its last update time.
///
/// Staleness is a data classification, not a scheduling mechanism:
/// callers pass `now` explicitly and nothing here ever waits.
pub fn classify(
    last_update: Option<OffsetDateTime>,
    interval_secs: u32,
    now: OffsetDateTime,
) -> Connectivity {
    let Some(last_update) = last_update else {
        return Connectivity::Unknown;
    };

    let interval = i64::from(interval_secs.max(DEFAULT_INTERVAL_SECS));
    let timeout_ms = interval * 2 * 1000 + GRACE_PERIOD_MS;
    let elapsed_ms = (now - last_update).whole_milliseconds() as i64;

    if elapsed_ms > timeout_ms {
        Connectivity::Missing
    } else {
        Connectivity::Ok
    }
}

/// Whether a configured interval is inside the accepted range.
pub fn validate_interval(interval_secs: u32) -> bool {
    (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&interval_secs)
}

/// Human-readable interval, e.g. `45s`, `2min`, `2min 30s`.
pub fn format_interval(interval_secs: u32) -> String {
    if interval_secs < 60 {
        return format!("{interval_secs}s");
    }

    let minutes = interval_secs / 60;
    let seconds = interval_secs % 60;
    if seconds == 0 {
        format!("{minutes}min")
    } else {
        format!("{minutes}min {seconds}s")
    }
}
