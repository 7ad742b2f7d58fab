//! Canonical sensor channel identity.
//!
//! Raw identifiers come in three shapes: composite keys
//! (`hardwareId:sensorType`), legacy bare keys (`sensorType`) and
//! measurement topics (`module/hardwareId/sensorType` or the legacy
//! `module/sensorType`). All of them resolve here, and nowhere else,
//! into a [`SensorKey`]. Unresolvable inputs yield `None`: shared
//! buses carry topics this engine does not know about, and those are
//! noise rather than errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry;

/// Hardware-position topic segments that denote status fragments,
/// never measurement channels.
const STATUS_SEGMENTS: [&str; 3] = ["sensors", "system", "hardware"];

/// Canonical identity of one measurement channel.
///
/// The composite form is preferred; a bare key is accepted only for
/// legacy producers that do not qualify the hardware.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SensorKey {
    hardware: Option<String>,
    sensor: String,
}

impl SensorKey {
    /// Composite key for a hardware-qualified channel. The sensor
    /// type must be canonical.
    pub fn composite(hardware: &str, sensor: &str) -> Option<Self> {
        if hardware.is_empty() || !registry::is_canonical(sensor) {
            return None;
        }
        Some(Self {
            hardware: Some(hardware.to_string()),
            sensor: sensor.to_string(),
        })
    }

    /// Bare legacy key. The sensor type must be canonical.
    pub fn bare(sensor: &str) -> Option<Self> {
        if !registry::is_canonical(sensor) {
            return None;
        }
        Some(Self {
            hardware: None,
            sensor: sensor.to_string(),
        })
    }

    /// Parse the canonical string form, `hardwareId:sensorType` or
    /// bare `sensorType`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.split_once(':') {
            Some((hardware, sensor)) => Self::composite(hardware, sensor),
            None => Self::bare(raw),
        }
    }

    pub fn hardware(&self) -> Option<&str> {
        self.hardware.as_deref()
    }

    pub fn sensor_type(&self) -> &str {
        &self.sensor
    }

    pub fn is_composite(&self) -> bool {
        self.hardware.is_some()
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hardware {
            Some(hardware) => write!(f, "{hardware}:{}", self.sensor),
            None => f.write_str(&self.sensor),
        }
    }
}

impl From<SensorKey> for String {
    fn from(key: SensorKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for SensorKey {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        SensorKey::parse(&raw).ok_or_else(|| format!("unresolvable sensor key: {raw}"))
    }
}

/// Resolve a measurement topic to its channel key.
///
/// Accepts the 3-segment form `module/hardwareId/sensorType` and the
/// 2-segment legacy form `module/sensorType`. Segments that denote
/// status fragments in the hardware position, unknown sensor types
/// and any other shape resolve to `None`.
pub fn resolve_topic(topic: &str) -> Option<SensorKey> {
    let parts: Vec<&str> = topic.split('/').collect();

    match parts.as_slice() {
        [_, sensor] => SensorKey::bare(sensor),
        [_, hardware, sensor] => {
            if STATUS_SEGMENTS.contains(hardware) {
                return None;
            }
            SensorKey::composite(hardware, sensor)
        }
        _ => None,
    }
}
