//! Inbound transport messages and the status-topic grammar.
//!
//! One message shape covers both channels: measurements carry a
//! `value`, status and config fragments carry `metadata`. The
//! transport collaborator delivers them; this crate only describes
//! them.

mod fragment;

pub use fragment::{
    MemoryPatch, OnlinePatch, SensorStatusPatch, SensorsConfigPatch, StatusFragment,
    SystemConfigPatch, SystemRuntimePatch,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const TOPIC_SYSTEM: &str = "/system";
pub const TOPIC_SYSTEM_CONFIG: &str = "/system/config";
pub const TOPIC_SENSORS_STATUS: &str = "/sensors/status";
pub const TOPIC_SENSORS_CONFIG: &str = "/sensors/config";
pub const TOPIC_HARDWARE_CONFIG: &str = "/hardware/config";
pub const TOPIC_ONLINE: &str = "/online";

/// Discriminates the five status/config fragment kinds plus the
/// liveness signal, by topic suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Runtime system data (RSSI, free heap)
    SystemRuntime,
    /// System configuration (ip, mac, flash, boot, module type)
    SystemConfig,
    /// Per-sensor value and reported status
    SensorsStatus,
    /// Per-sensor interval and model
    SensorsConfig,
    /// Hardware descriptors
    HardwareConfig,
    /// Online/offline liveness signal
    Online,
}

impl FragmentKind {
    /// Match a topic against the fixed suffix table.
    ///
    /// `/system/config` must be tested before `/system`; both end in
    /// a segment the other does not contain, but a config topic also
    /// ends in neither of the shorter suffixes.
    pub fn match_suffix(topic: &str) -> Option<Self> {
        if topic.ends_with(TOPIC_SYSTEM_CONFIG) {
            Some(Self::SystemConfig)
        } else if topic.ends_with(TOPIC_SYSTEM) {
            Some(Self::SystemRuntime)
        } else if topic.ends_with(TOPIC_SENSORS_STATUS) {
            Some(Self::SensorsStatus)
        } else if topic.ends_with(TOPIC_SENSORS_CONFIG) {
            Some(Self::SensorsConfig)
        } else if topic.ends_with(TOPIC_HARDWARE_CONFIG) {
            Some(Self::HardwareConfig)
        } else if topic.ends_with(TOPIC_ONLINE) {
            Some(Self::Online)
        } else {
            None
        }
    }
}

/// True when the topic addresses a status/config fragment rather
/// than a measurement channel.
pub fn is_status_topic(topic: &str) -> bool {
    FragmentKind::match_suffix(topic).is_some()
}

/// One inbound message from the transport collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// `module/hardwareId/sensorType`, the legacy
    /// `module/sensorType`, or a status-fragment path
    pub topic: String,
    /// Measured value; absent for status/config messages
    pub value: Option<f64>,
    /// Publication time
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Structured fragment for status/config messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    /// Whether this message carries a measurement.
    pub fn is_measurement(&self) -> bool {
        self.value.is_some() && !is_status_topic(&self.topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_table() {
        assert_eq!(
            FragmentKind::match_suffix("module-a/system"),
            Some(FragmentKind::SystemRuntime)
        );
        assert_eq!(
            FragmentKind::match_suffix("module-a/system/config"),
            Some(FragmentKind::SystemConfig)
        );
        assert_eq!(
            FragmentKind::match_suffix("module-a/sensors/status"),
            Some(FragmentKind::SensorsStatus)
        );
        assert_eq!(
            FragmentKind::match_suffix("module-a/sensors/config"),
            Some(FragmentKind::SensorsConfig)
        );
        assert_eq!(
            FragmentKind::match_suffix("module-a/hardware/config"),
            Some(FragmentKind::HardwareConfig)
        );
        assert_eq!(
            FragmentKind::match_suffix("module-a/online"),
            Some(FragmentKind::Online)
        );
        assert_eq!(FragmentKind::match_suffix("module-a/mhz14a/co2"), None);
    }

    #[test]
    fn test_message_deserializes_wire_format() {
        let json = r#"{"topic":"module-a/mhz14a/co2","value":850,"time":"2024-05-01T12:00:00Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert!(message.is_measurement());
        assert_eq!(message.value, Some(850.0));
        assert!(message.metadata.is_none());
    }

    #[test]
    fn test_status_message_is_not_a_measurement() {
        let json = r#"{"topic":"module-a/system","value":null,"time":"2024-05-01T12:00:00Z","metadata":{"rssi":-61}}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert!(!message.is_measurement());
        assert!(is_status_topic(&message.topic));
    }
}
