//! Fragment merging for the device status snapshot.
//!
//! Status arrives as sparse fragments, each owning one section of the
//! snapshot. Merging is field-wise: an absent field in the incoming
//! fragment leaves the stored field untouched, so sections assembled
//! from different topics never erase each other.

use std::collections::BTreeMap;

use aerosync_api::message::{
    MemoryPatch, OnlinePatch, SensorStatusPatch, SensorsConfigPatch, StatusFragment,
    SystemConfigPatch, SystemRuntimePatch,
};
use aerosync_api::models::{
    DeviceStatusSnapshot, HardwareInfo, MemoryInfo, SensorStatus, SystemInfo,
};
use time::OffsetDateTime;

/// Merge one decoded fragment into the snapshot.
pub fn apply_fragment(status: &mut DeviceStatusSnapshot, fragment: &StatusFragment, now: OffsetDateTime) {
    match fragment {
        StatusFragment::SystemRuntime(patch) => merge_system_runtime(&mut status.system, patch),
        StatusFragment::SystemConfig(patch) => merge_system_config(status, patch, now),
        StatusFragment::SensorsStatus(sensors) => merge_sensors_status(&mut status.sensors, sensors, now),
        StatusFragment::SensorsConfig(patch) => merge_sensors_config(status, patch),
        StatusFragment::HardwareConfig(hardware) => merge_hardware_config(&mut status.hardware, hardware),
        StatusFragment::Online(patch) => merge_online(&mut status.system, patch, now),
    }
}

fn merge_memory(memory: &mut MemoryInfo, patch: &MemoryPatch) {
    if let Some(total) = patch.heap_total_kb {
        memory.heap_total_kb = Some(total);
    }
    if let Some(free) = patch.heap_free_kb {
        memory.heap_free_kb = Some(free);
    }
    if let Some(min_free) = patch.heap_min_free_kb {
        memory.heap_min_free_kb = Some(min_free);
    }
    if let Some(psram) = patch.psram {
        memory.psram = Some(psram);
    }
}

fn merge_system_runtime(system: &mut SystemInfo, patch: &SystemRuntimePatch) {
    if let Some(rssi) = patch.rssi {
        system.rssi = Some(rssi);
    }
    if let Some(memory) = &patch.memory {
        merge_memory(system.memory.get_or_insert_with(MemoryInfo::default), memory);
    }
}

fn merge_system_config(status: &mut DeviceStatusSnapshot, patch: &SystemConfigPatch, now: OffsetDateTime) {
    let system = &mut status.system;
    if let Some(ip) = &patch.ip {
        system.ip = Some(ip.clone());
    }
    if let Some(mac) = &patch.mac {
        system.mac = Some(mac.clone());
    }
    if let Some(uptime_start) = patch.uptime_start {
        system.uptime_start = Some(uptime_start);
    }
    if let Some(flash) = patch.flash {
        system.flash = Some(flash);
    }
    if let Some(memory) = &patch.memory {
        merge_memory(system.memory.get_or_insert_with(MemoryInfo::default), memory);
    }
    if let Some(module_type) = &patch.module_type {
        status.module_type = Some(module_type.clone());
    }

    // anchor for deriving uptime from the device-side counter
    system.config_received_at = Some(now.unix_timestamp());
}

fn merge_sensors_status(
    sensors: &mut BTreeMap<String, SensorStatus>,
    patch: &BTreeMap<String, SensorStatusPatch>,
    now: OffsetDateTime,
) {
    for (sensor, incoming) in patch {
        let entry = sensors.entry(sensor.clone()).or_default();
        if let Some(status) = &incoming.status {
            entry.status = Some(status.clone());
        }
        if let Some(value) = incoming.value {
            entry.value = Some(value);
            entry.last_update = Some(now);
        }
    }
}

fn merge_sensors_config(status: &mut DeviceStatusSnapshot, patch: &SensorsConfigPatch) {
    for (sensor, incoming) in &patch.sensors {
        let entry = status.sensors_config.entry(sensor.clone()).or_default();
        if let Some(interval) = incoming.interval {
            entry.interval = Some(interval);
        }
        if let Some(model) = &incoming.model {
            entry.model = Some(model.clone());
        }
    }
}

fn merge_hardware_config(hardware: &mut HardwareInfo, incoming: &HardwareInfo) {
    let Some(patch) = &incoming.chip else {
        return;
    };
    let chip = hardware.chip.get_or_insert_with(Default::default);
    if let Some(model) = &patch.model {
        chip.model = Some(model.clone());
    }
    if let Some(rev) = patch.rev {
        chip.rev = Some(rev);
    }
    if let Some(freq) = patch.cpu_freq_mhz {
        chip.cpu_freq_mhz = Some(freq);
    }
    if let Some(flash_kb) = patch.flash_kb {
        chip.flash_kb = Some(flash_kb);
    }
    if let Some(cores) = patch.cores {
        chip.cores = Some(cores);
    }
}

fn merge_online(system: &mut SystemInfo, patch: &OnlinePatch, now: OffsetDateTime) {
    system.online = Some(patch.online);
    if patch.online {
        system.disconnected_at = None;
    } else {
        system.booted_at = None;
        system.disconnected_at = Some(now);
    }
}

/// Merge a full snapshot fetched from an upstream API into the live
/// one, section by section. Upstream data is sparse in the same way
/// fragments are, so only present fields overwrite.
pub fn merge_dashboard_status(status: &mut DeviceStatusSnapshot, incoming: &DeviceStatusSnapshot) {
    let system = &incoming.system;
    let target = &mut status.system;
    if let Some(ip) = &system.ip {
        target.ip = Some(ip.clone());
    }
    if let Some(mac) = &system.mac {
        target.mac = Some(mac.clone());
    }
    if let Some(online) = system.online {
        target.online = Some(online);
    }
    if let Some(booted_at) = system.booted_at {
        target.booted_at = Some(booted_at);
    }
    if let Some(disconnected_at) = system.disconnected_at {
        target.disconnected_at = Some(disconnected_at);
    }
    if let Some(uptime_start) = system.uptime_start {
        target.uptime_start = Some(uptime_start);
    }
    if let Some(received_at) = system.config_received_at {
        target.config_received_at = Some(received_at);
    }
    if let Some(flash) = system.flash {
        target.flash = Some(flash);
    }
    if let Some(memory) = &system.memory {
        let target_memory = target.memory.get_or_insert_with(MemoryInfo::default);
        if let Some(total) = memory.heap_total_kb {
            target_memory.heap_total_kb = Some(total);
        }
        if let Some(free) = memory.heap_free_kb {
            target_memory.heap_free_kb = Some(free);
        }
        if let Some(min_free) = memory.heap_min_free_kb {
            target_memory.heap_min_free_kb = Some(min_free);
        }
        if let Some(psram) = memory.psram {
            target_memory.psram = Some(psram);
        }
    }
    if let Some(rssi) = system.rssi {
        target.rssi = Some(rssi);
    }

    for (sensor, incoming_status) in &incoming.sensors {
        let entry = status.sensors.entry(sensor.clone()).or_default();
        if let Some(sensor_status) = &incoming_status.status {
            entry.status = Some(sensor_status.clone());
        }
        if let Some(value) = incoming_status.value {
            entry.value = Some(value);
        }
        if let Some(last_update) = incoming_status.last_update {
            entry.last_update = Some(last_update);
        }
    }

    for (sensor, incoming_config) in &incoming.sensors_config {
        let entry = status.sensors_config.entry(sensor.clone()).or_default();
        if let Some(interval) = incoming_config.interval {
            entry.interval = Some(interval);
        }
        if let Some(model) = &incoming_config.model {
            entry.model = Some(model.clone());
        }
    }

    merge_hardware_config(&mut status.hardware, &incoming.hardware);

    if let Some(module_type) = &incoming.module_type {
        status.module_type = Some(module_type.clone());
    }
    if let Some(zone_name) = &incoming.zone_name {
        status.zone_name = Some(zone_name.clone());
    }
}

/// Reflect a live measurement into the sensor status table so the
/// snapshot stays consistent with the series even when the device
/// publishes status updates less often than measurements.
pub fn record_measurement(
    status: &mut DeviceStatusSnapshot,
    sensor_type: &str,
    value: f64,
    time: OffsetDateTime,
) {
    let entry = status.sensors.entry(sensor_type.to_owned()).or_default();
    entry.value = Some(value);
    entry.status = Some("ok".to_owned());
    entry.last_update = Some(time);
}

#[cfg(test)]
mod tests {
    use aerosync_api::message::FragmentKind;
    use serde_json::json;
    use time::macros::datetime;

    use super::*;

    const NOW: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

    fn fragment(kind: FragmentKind, metadata: serde_json::Value) -> StatusFragment {
        StatusFragment::decode(kind, &metadata).unwrap()
    }

    #[test]
    fn test_sparse_config_preserves_absent_fields() {
        let mut status = DeviceStatusSnapshot::default();
        apply_fragment(
            &mut status,
            &fragment(
                FragmentKind::SystemConfig,
                json!({"ip": "192.168.1.40", "mac": "a4:cf:12:05:33:9e"}),
            ),
            NOW,
        );
        apply_fragment(
            &mut status,
            &fragment(FragmentKind::SystemConfig, json!({"ip": "192.168.1.41"})),
            NOW,
        );

        assert_eq!(status.system.ip.as_deref(), Some("192.168.1.41"));
        assert_eq!(status.system.mac.as_deref(), Some("a4:cf:12:05:33:9e"));
        assert_eq!(status.system.config_received_at, Some(NOW.unix_timestamp()));
    }

    #[test]
    fn test_runtime_fragment_never_touches_config_fields() {
        let mut status = DeviceStatusSnapshot::default();
        apply_fragment(
            &mut status,
            &fragment(
                FragmentKind::SystemConfig,
                json!({"ip": "192.168.1.40", "memory": {"heapTotalKb": 320}}),
            ),
            NOW,
        );
        apply_fragment(
            &mut status,
            &fragment(FragmentKind::SystemRuntime, json!({"rssi": -58, "memory": {"heapFreeKb": 144}})),
            NOW,
        );

        let memory = status.system.memory.unwrap();
        assert_eq!(memory.heap_total_kb, Some(320));
        assert_eq!(memory.heap_free_kb, Some(144));
        assert_eq!(status.system.rssi, Some(-58));
        assert_eq!(status.system.ip.as_deref(), Some("192.168.1.40"));
    }

    #[test]
    fn test_sensors_status_merges_per_sensor() {
        let mut status = DeviceStatusSnapshot::default();
        apply_fragment(
            &mut status,
            &fragment(
                FragmentKind::SensorsStatus,
                json!({"co2": {"status": "ok", "value": 640.0}, "voc": {"status": "warming"}}),
            ),
            NOW,
        );
        apply_fragment(
            &mut status,
            &fragment(FragmentKind::SensorsStatus, json!({"co2": {"value": 655.0}})),
            NOW,
        );

        assert_eq!(status.sensors["co2"].value, Some(655.0));
        assert_eq!(status.sensors["co2"].status.as_deref(), Some("ok"));
        assert_eq!(status.sensors["voc"].status.as_deref(), Some("warming"));
        assert!(status.sensors["voc"].last_update.is_none());
        assert_eq!(status.sensors["co2"].last_update, Some(NOW));
    }

    #[test]
    fn test_sensors_config_keeps_model_on_interval_update() {
        let mut status = DeviceStatusSnapshot::default();
        apply_fragment(
            &mut status,
            &fragment(
                FragmentKind::SensorsConfig,
                json!({"sensors": {"co2": {"interval": 30, "model": "MH-Z14A"}}}),
            ),
            NOW,
        );
        apply_fragment(
            &mut status,
            &fragment(FragmentKind::SensorsConfig, json!({"sensors": {"co2": {"interval": 60}}})),
            NOW,
        );

        assert_eq!(status.sensors_config["co2"].interval, Some(60));
        assert_eq!(status.sensors_config["co2"].model.as_deref(), Some("MH-Z14A"));
    }

    #[test]
    fn test_offline_clears_boot_time_and_stamps_disconnect() {
        let mut status = DeviceStatusSnapshot::default();
        status.system.booted_at = Some(datetime!(2024-05-01 08:00:00 UTC));

        apply_fragment(&mut status, &fragment(FragmentKind::Online, json!({"online": false})), NOW);
        assert_eq!(status.system.online, Some(false));
        assert!(status.system.booted_at.is_none());
        assert_eq!(status.system.disconnected_at, Some(NOW));

        apply_fragment(&mut status, &fragment(FragmentKind::Online, json!({"online": true})), NOW);
        assert_eq!(status.system.online, Some(true));
        assert!(status.system.disconnected_at.is_none());
    }

    #[test]
    fn test_dashboard_merge_is_section_wise() {
        let mut status = DeviceStatusSnapshot::default();
        record_measurement(&mut status, "co2", 612.0, NOW);

        let mut incoming = DeviceStatusSnapshot::default();
        incoming.system.ip = Some("192.168.1.40".to_owned());
        incoming.zone_name = Some("workshop".to_owned());
        merge_dashboard_status(&mut status, &incoming);

        assert_eq!(status.system.ip.as_deref(), Some("192.168.1.40"));
        assert_eq!(status.zone_name.as_deref(), Some("workshop"));
        assert_eq!(status.sensors["co2"].value, Some(612.0));
    }

    #[test]
    fn test_record_measurement_marks_channel_ok() {
        let mut status = DeviceStatusSnapshot::default();
        status.sensors.insert(
            "co2".to_owned(),
            SensorStatus {
                status: Some("warming".to_owned()),
                value: None,
                last_update: None,
            },
        );

        record_measurement(&mut status, "co2", 640.0, NOW);
        let sensor = &status.sensors["co2"];
        assert_eq!(sensor.status.as_deref(), Some("ok"));
        assert_eq!(sensor.value, Some(640.0));
        assert_eq!(sensor.last_update, Some(NOW));
    }
}
