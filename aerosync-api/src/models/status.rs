use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Derived connectivity classification for a sensor channel.
///
/// Never stored on the snapshot; recomputed on read from the last
/// update time and the configured sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Data seen within the expected sampling window
    Ok,
    /// No data for more than twice the sampling interval plus grace
    Missing,
    /// Never received any data
    Unknown,
}

/// Last reported state of one sensor, as published by the device.
///
/// `status` is the device's own wording ("ok", "disabled", ...);
/// the engine does not interpret it beyond displaying it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorStatus {
    pub status: Option<String>,
    pub value: Option<f64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}

/// Per-sensor configuration as published by the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorConfig {
    /// Sampling interval in seconds
    pub interval: Option<u32>,
    /// Hardware model backing this sensor
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlashInfo {
    pub size: Option<u64>,
    pub used: Option<u64>,
    pub used_kb: Option<u32>,
    pub free_kb: Option<u32>,
    pub system_kb: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PsramInfo {
    pub total: Option<u64>,
    pub free: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryInfo {
    pub heap_total_kb: Option<u32>,
    pub heap_free_kb: Option<u32>,
    pub heap_min_free_kb: Option<u32>,
    pub psram: Option<PsramInfo>,
}

/// Network, runtime, memory and boot information for a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemInfo {
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub online: Option<bool>,
    /// When the module last booted, as reported upstream
    #[serde(with = "time::serde::rfc3339::option")]
    pub booted_at: Option<OffsetDateTime>,
    /// When the liveness signal last went offline
    #[serde(with = "time::serde::rfc3339::option")]
    pub disconnected_at: Option<OffsetDateTime>,
    /// Device-side uptime counter at config publication
    pub uptime_start: Option<u64>,
    /// Unix seconds when the system config fragment was received,
    /// used together with `uptime_start` to derive uptime
    pub config_received_at: Option<i64>,
    pub flash: Option<FlashInfo>,
    pub memory: Option<MemoryInfo>,
    pub rssi: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChipInfo {
    pub model: Option<String>,
    pub rev: Option<u32>,
    pub cpu_freq_mhz: Option<u32>,
    pub flash_kb: Option<u32>,
    pub cores: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareInfo {
    pub chip: Option<ChipInfo>,
}

/// Aggregated status of one module, assembled from partial fragments.
///
/// Each section is merged independently: a fragment touching `system`
/// never clears `sensors`, and within a section only the fields
/// present in the incoming fragment are overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceStatusSnapshot {
    pub system: SystemInfo,
    pub sensors: BTreeMap<String, SensorStatus>,
    pub sensors_config: BTreeMap<String, SensorConfig>,
    pub hardware: HardwareInfo,
    pub module_type: Option<String>,
    pub zone_name: Option<String>,
}
