use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One measurement point for a single module sensor channel.
///
/// Readings are immutable once stored; the series buffer owning them
/// only ever inserts, evicts or replaces whole points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Acquisition time
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Measured value in the sensor's native unit
    pub value: f64,
}

impl SensorReading {
    pub fn new(time: OffsetDateTime, value: f64) -> Self {
        Self { time, value }
    }

    /// Unix time in milliseconds, the granularity used for
    /// deduplication bucketing.
    pub fn unix_ms(&self) -> i64 {
        (self.time.unix_timestamp_nanos() / 1_000_000) as i64
    }
}
