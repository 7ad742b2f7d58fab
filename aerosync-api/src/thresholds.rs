//! Health-band evaluation against fixed air-quality guidelines.
//!
//! Upper bounds derive from WHO indoor-air recommendations, EPA AQI
//! breakpoints and the German UBA TVOC scheme. They are scientific
//! constants, not user configuration. Sensor types without a banding
//! (temperature, pressure) intentionally classify to nothing.

use crate::registry;

/// Value health band, worst last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthBand {
    Good,
    Moderate,
    Poor,
    Hazardous,
}

/// Upper bounds of the first three bands; everything at or above
/// `poor` is hazardous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandBounds {
    pub good: f64,
    pub moderate: f64,
    pub poor: f64,
}

const fn bounds(good: f64, moderate: f64, poor: f64) -> BandBounds {
    BandBounds { good, moderate, poor }
}

/// Keys are pre-normalized: lowercase, `_` and `-` stripped.
const BANDS: [(&str, BandBounds); 13] = [
    // WHO indoor CO2 recommendations
    ("co2", bounds(800.0, 1000.0, 1500.0)),
    ("eco2", bounds(800.0, 1000.0, 1500.0)),
    // WHO carbon monoxide guideline, 8h exposure
    ("co", bounds(9.0, 35.0, 100.0)),
    // German UBA TVOC scheme
    ("tvoc", bounds(220.0, 660.0, 2200.0)),
    // SGP40 VOC index, 0-500 scale with 100 as clean-air reference
    ("voc", bounds(150.0, 250.0, 400.0)),
    // Optimal range is 30-60%; only the upper side is banded
    ("humidity", bounds(60.0, 70.0, 80.0)),
    ("hum", bounds(60.0, 70.0, 80.0)),
    ("humsht", bounds(60.0, 70.0, 80.0)),
    // EPA AQI breakpoints, 24h averages
    ("pm25", bounds(12.0, 35.0, 55.0)),
    ("pm2.5", bounds(12.0, 35.0, 55.0)),
    ("pm10", bounds(54.0, 154.0, 254.0)),
    // No official EPA breakpoints; stricter than PM2.5
    ("pm1", bounds(10.0, 25.0, 50.0)),
    // Interpolated between PM2.5 and PM10
    ("pm4", bounds(25.0, 50.0, 100.0)),
];

/// Banded pollutant types where a rising value means worse air.
const LOWER_IS_BETTER: [&str; 9] = [
    "co2", "eco2", "co", "tvoc", "voc", "pm25", "pm10", "pm1", "pm4",
];

/// Types with a safe mid-range optimum; trend direction carries no
/// judgment for these.
const NEUTRAL_TREND: [&str; 8] = [
    "humidity", "hum", "humsht", "temperature", "temp", "tempsht", "temperaturebmp", "pressure",
];

/// Observed direction of a series between two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Lowercase the sensor-type suffix and strip separator characters.
fn normalize(key: &str) -> String {
    registry::sensor_type(key)
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Band bounds for a sensor key, if the type is banded.
pub fn band_bounds(key: &str) -> Option<BandBounds> {
    let normalized = normalize(key);
    BANDS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, bounds)| *bounds)
}

/// Whether the sensor type has a health banding at all.
pub fn has_band(key: &str) -> bool {
    band_bounds(key).is_some()
}

/// Classify a value into its health band.
///
/// `None` for unbanded sensor types and for non-finite values; both
/// are expected inputs, not failures.
pub fn evaluate(key: &str, value: f64) -> Option<HealthBand> {
    if !value.is_finite() {
        return None;
    }
    let bounds = band_bounds(key)?;

    Some(if value < bounds.good {
        HealthBand::Good
    } else if value < bounds.moderate {
        HealthBand::Moderate
    } else if value < bounds.poor {
        HealthBand::Poor
    } else {
        HealthBand::Hazardous
    })
}

/// Whether an observed trend is good news for this sensor type.
///
/// `Some(true)` means the direction is an improvement, `Some(false)`
/// a degradation, `None` no judgment (stable trends, mid-range-optimum
/// types such as humidity and temperature, and unknown types).
pub fn trend_sentiment(key: &str, trend: Trend) -> Option<bool> {
    if trend == Trend::Stable {
        return None;
    }

    let normalized = normalize(key);
    if NEUTRAL_TREND.contains(&normalized.as_str()) {
        return None;
    }
    if LOWER_IS_BETTER.contains(&normalized.as_str()) {
        return Some(trend == Trend::Down);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_co2_band_boundaries() {
        assert_eq!(evaluate("co2", 799.0), Some(HealthBand::Good));
        assert_eq!(evaluate("co2", 800.0), Some(HealthBand::Moderate));
        assert_eq!(evaluate("co2", 999.9), Some(HealthBand::Moderate));
        assert_eq!(evaluate("co2", 1000.0), Some(HealthBand::Poor));
        assert_eq!(evaluate("co2", 1500.0), Some(HealthBand::Hazardous));
    }

    #[test]
    fn test_composite_key_resolves_to_suffix() {
        assert_eq!(evaluate("mhz14a:co2", 1600.0), Some(HealthBand::Hazardous));
        assert_eq!(evaluate("sps30:pm25", 11.0), Some(HealthBand::Good));
    }

    #[test]
    fn test_key_normalization_strips_separators() {
        assert_eq!(evaluate("PM2.5", 40.0), Some(HealthBand::Poor));
        assert_eq!(evaluate("hum_sht", 72.0), Some(HealthBand::Poor));
        assert!(has_band("HUM-SHT"));
    }

    #[test]
    fn test_unbanded_types_classify_to_nothing() {
        assert_eq!(evaluate("temperature", 45.0), None);
        assert_eq!(evaluate("bmp280:pressure", 1013.0), None);
        assert!(!has_band("pressure"));
    }

    #[test]
    fn test_non_finite_values_classify_to_nothing() {
        assert_eq!(evaluate("co2", f64::NAN), None);
        assert_eq!(evaluate("co2", f64::INFINITY), None);
    }

    #[test]
    fn test_trend_sentiment_for_pollutants() {
        assert_eq!(trend_sentiment("co2", Trend::Up), Some(false));
        assert_eq!(trend_sentiment("co2", Trend::Down), Some(true));
        assert_eq!(trend_sentiment("mhz14a:co2", Trend::Up), Some(false));
        assert_eq!(trend_sentiment("sps30:pm25", Trend::Down), Some(true));
    }

    #[test]
    fn test_trend_sentiment_neutral_types() {
        assert_eq!(trend_sentiment("humidity", Trend::Up), None);
        assert_eq!(trend_sentiment("dht22:temperature", Trend::Down), None);
        assert_eq!(trend_sentiment("pressure", Trend::Up), None);
        assert_eq!(trend_sentiment("co2", Trend::Stable), None);
    }
}
