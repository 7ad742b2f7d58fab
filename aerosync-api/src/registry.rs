//! Static sensor and hardware catalogues.
//!
//! Twelve canonical sensor types cover everything the modules
//! publish; hardware descriptors map physical chips to the types
//! they measure. Lookups accept composite keys and resolve them by
//! their sensor-type suffix.

/// Broad grouping used by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCategory {
    Gas,
    Weather,
    ParticulateMatter,
}

#[derive(Debug, Clone, Copy)]
pub struct SensorDef {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    /// Plausible display range for chart axes
    pub range: (f64, f64),
    pub category: SensorCategory,
}

#[derive(Debug, Clone, Copy)]
pub struct HardwareDef {
    pub id: &'static str,
    pub name: &'static str,
    /// Sensor types this chip measures
    pub measures: &'static [&'static str],
}

pub const SENSORS: [SensorDef; 12] = [
    SensorDef { key: "co2", label: "CO2", unit: "ppm", range: (0.0, 10_000.0), category: SensorCategory::Gas },
    SensorDef { key: "eco2", label: "eCO2", unit: "ppm", range: (0.0, 10_000.0), category: SensorCategory::Gas },
    SensorDef { key: "voc", label: "VOC", unit: "/500", range: (0.0, 500.0), category: SensorCategory::Gas },
    SensorDef { key: "tvoc", label: "TVOC", unit: "ppb", range: (0.0, 5_000.0), category: SensorCategory::Gas },
    SensorDef { key: "co", label: "CO", unit: "ppm", range: (0.0, 1_000.0), category: SensorCategory::Gas },
    SensorDef { key: "temperature", label: "Temperature", unit: "°C", range: (-10.0, 50.0), category: SensorCategory::Weather },
    SensorDef { key: "humidity", label: "Humidity", unit: "%", range: (0.0, 100.0), category: SensorCategory::Weather },
    SensorDef { key: "pressure", label: "Pressure", unit: "hPa", range: (300.0, 1_100.0), category: SensorCategory::Weather },
    SensorDef { key: "pm1", label: "PM1.0", unit: "µg/m³", range: (0.0, 5_000.0), category: SensorCategory::ParticulateMatter },
    SensorDef { key: "pm25", label: "PM2.5", unit: "µg/m³", range: (0.0, 5_000.0), category: SensorCategory::ParticulateMatter },
    SensorDef { key: "pm4", label: "PM4.0", unit: "µg/m³", range: (0.0, 5_000.0), category: SensorCategory::ParticulateMatter },
    SensorDef { key: "pm10", label: "PM10", unit: "µg/m³", range: (0.0, 5_000.0), category: SensorCategory::ParticulateMatter },
];

pub const HARDWARE: [HardwareDef; 9] = [
    HardwareDef { id: "dht22", name: "DHT22", measures: &["temperature", "humidity"] },
    HardwareDef { id: "sht40", name: "SHT40", measures: &["temperature", "humidity"] },
    HardwareDef { id: "bmp280", name: "BMP280", measures: &["temperature", "pressure"] },
    HardwareDef { id: "mhz14a", name: "MH-Z14A", measures: &["co2"] },
    HardwareDef { id: "sgp40", name: "SGP40", measures: &["voc"] },
    HardwareDef { id: "sgp30", name: "SGP30", measures: &["eco2", "tvoc"] },
    HardwareDef { id: "mq7", name: "MQ-7", measures: &["co"] },
    HardwareDef { id: "sc16co", name: "SC16-CO", measures: &["co"] },
    HardwareDef { id: "sps30", name: "SPS30", measures: &["pm1", "pm25", "pm4", "pm10"] },
];

/// Sensor-type suffix of a possibly composite key.
pub fn sensor_type(key: &str) -> &str {
    match key.split_once(':') {
        Some((_, sensor)) => sensor,
        None => key,
    }
}

/// Look up a sensor definition; composite keys resolve by suffix.
pub fn sensor(key: &str) -> Option<&'static SensorDef> {
    let sensor = sensor_type(key);
    SENSORS.iter().find(|def| def.key == sensor)
}

/// Whether the given key names a canonical sensor type.
pub fn is_canonical(sensor: &str) -> bool {
    SENSORS.iter().any(|def| def.key == sensor)
}

pub fn unit(key: &str) -> &'static str {
    sensor(key).map(|def| def.unit).unwrap_or("")
}

pub fn range(key: &str) -> Option<(f64, f64)> {
    sensor(key).map(|def| def.range)
}

pub fn hardware(id: &str) -> Option<&'static HardwareDef> {
    HARDWARE.iter().find(|def| def.id == id)
}

/// First hardware descriptor measuring the given sensor type.
pub fn hardware_for(sensor: &str) -> Option<&'static HardwareDef> {
    HARDWARE.iter().find(|def| def.measures.contains(&sensor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_lookup_accepts_composite_keys() {
        assert_eq!(sensor("mhz14a:co2").unwrap().key, "co2");
        assert_eq!(sensor("co2").unwrap().unit, "ppm");
        assert!(sensor("mhz14a:unknown").is_none());
    }

    #[test]
    fn test_unit_defaults_to_empty() {
        assert_eq!(unit("dht22:temperature"), "°C");
        assert_eq!(unit("nonexistent"), "");
    }

    #[test]
    fn test_hardware_for_sensor_type() {
        assert_eq!(hardware_for("pm25").unwrap().id, "sps30");
        assert_eq!(hardware_for("co").unwrap().id, "mq7");
        assert!(hardware_for("radon").is_none());
    }

    #[test]
    fn test_every_hardware_measure_is_canonical() {
        for hw in HARDWARE {
            for measure in hw.measures {
                assert!(is_canonical(measure), "{measure} missing from SENSORS");
            }
        }
    }
}
