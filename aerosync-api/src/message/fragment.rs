//! Typed status/config fragment payloads.
//!
//! Fragments are sparse patches: every field is optional and only
//! present fields are merged into the snapshot. Decoding is strict
//! per kind so a fragment can never touch a section it does not own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FragmentKind;
use crate::models::{FlashInfo, HardwareInfo, PsramInfo, SensorConfig};

/// Memory fields a fragment may carry. Runtime fragments publish the
/// free counters, config fragments the totals; both share this shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryPatch {
    pub heap_total_kb: Option<u32>,
    pub heap_free_kb: Option<u32>,
    pub heap_min_free_kb: Option<u32>,
    pub psram: Option<PsramInfo>,
}

/// Runtime system data: signal strength and heap pressure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemRuntimePatch {
    pub rssi: Option<i32>,
    pub memory: Option<MemoryPatch>,
}

/// System configuration published once per boot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfigPatch {
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub uptime_start: Option<u64>,
    pub flash: Option<FlashInfo>,
    pub memory: Option<MemoryPatch>,
    pub module_type: Option<String>,
}

/// Per-sensor status entry as published on `/sensors/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorStatusPatch {
    pub status: Option<String>,
    pub value: Option<f64>,
}

/// Per-sensor configuration as published on `/sensors/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfigPatch {
    pub sensors: BTreeMap<String, SensorConfig>,
}

/// Liveness signal, typically a broker last-will message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnlinePatch {
    pub online: bool,
}

/// A decoded fragment, tagged with the section it owns.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusFragment {
    SystemRuntime(SystemRuntimePatch),
    SystemConfig(SystemConfigPatch),
    SensorsStatus(BTreeMap<String, SensorStatusPatch>),
    SensorsConfig(SensorsConfigPatch),
    HardwareConfig(HardwareInfo),
    Online(OnlinePatch),
}

impl StatusFragment {
    /// Decode fragment metadata for the given kind.
    pub fn decode(kind: FragmentKind, metadata: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let metadata = metadata.clone();
        Ok(match kind {
            FragmentKind::SystemRuntime => Self::SystemRuntime(serde_json::from_value(metadata)?),
            FragmentKind::SystemConfig => Self::SystemConfig(serde_json::from_value(metadata)?),
            FragmentKind::SensorsStatus => Self::SensorsStatus(serde_json::from_value(metadata)?),
            FragmentKind::SensorsConfig => Self::SensorsConfig(serde_json::from_value(metadata)?),
            FragmentKind::HardwareConfig => Self::HardwareConfig(serde_json::from_value(metadata)?),
            FragmentKind::Online => Self::Online(serde_json::from_value(metadata)?),
        })
    }

    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::SystemRuntime(_) => FragmentKind::SystemRuntime,
            Self::SystemConfig(_) => FragmentKind::SystemConfig,
            Self::SensorsStatus(_) => FragmentKind::SensorsStatus,
            Self::SensorsConfig(_) => FragmentKind::SensorsConfig,
            Self::HardwareConfig(_) => FragmentKind::HardwareConfig,
            Self::Online(_) => FragmentKind::Online,
        }
    }
}
