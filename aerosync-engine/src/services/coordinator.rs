//! Entry point tying the registry, series buffers and status
//! snapshots together.
//!
//! The coordinator receives live messages from the transport
//! collaborator, dashboard payloads from the upstream API, and serves
//! reads for consumers. All operations are synchronous and never
//! block on anything but the per-module locks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use aerosync_api::keys::{self, SensorKey};
use aerosync_api::message::{FragmentKind, Message, StatusFragment};
use aerosync_api::models::{Connectivity, DeviceStatusSnapshot, SensorReading};
use aerosync_api::thresholds::{self, HealthBand};
use aerosync_api::{registry, staleness};
use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use super::{ModuleRegistry, apply_fragment, merge_dashboard_status, record_measurement};
use crate::configs::Telemetry;
use crate::errors::TelemetryError;

/// Ingest counters, updated lock-free on the hot path.
#[derive(Debug, Default)]
struct IngestStats {
    measurements: AtomicU64,
    fragments: AtomicU64,
    unresolved_topics: AtomicU64,
    dropped_readings: AtomicU64,
}

/// Point-in-time copy of the ingest counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSnapshot {
    pub measurements: u64,
    pub fragments: u64,
    pub unresolved_topics: u64,
    pub dropped_readings: u64,
}

impl IngestStats {
    fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            measurements: self.measurements.load(Ordering::Relaxed),
            fragments: self.fragments.load(Ordering::Relaxed),
            unresolved_topics: self.unresolved_topics.load(Ordering::Relaxed),
            dropped_readings: self.dropped_readings.load(Ordering::Relaxed),
        }
    }
}

/// One raw historical point as fetched from the upstream API,
/// timestamp still unparsed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPoint {
    pub time: String,
    pub value: f64,
}

/// Historical payload for one module: a status snapshot and series
/// batches keyed by channel, each batch newest-first as the upstream
/// API delivers them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardPayload {
    pub status: Option<DeviceStatusSnapshot>,
    pub sensors: BTreeMap<String, Vec<RawPoint>>,
}

/// Owning facade over all per-module telemetry state.
#[derive(Debug)]
pub struct ModuleDataCoordinator {
    registry: ModuleRegistry,
    stats: IngestStats,
}

impl ModuleDataCoordinator {
    pub fn new(telemetry: &Telemetry) -> Self {
        Self::with_capacity(telemetry.history_capacity)
    }

    pub fn with_capacity(series_capacity: usize) -> Self {
        Self {
            registry: ModuleRegistry::new(series_capacity),
            stats: IngestStats::default(),
        }
    }

    /// Route one live message to the owning module.
    ///
    /// Status topics are merged as fragments, measurement topics are
    /// appended to the channel series and reflected into the sensor
    /// status table. Anything else is counted and dropped.
    pub fn handle_message(&self, module_id: &str, message: &Message) {
        if let Some(kind) = FragmentKind::match_suffix(&message.topic) {
            self.handle_fragment(module_id, kind, message);
        } else if let Some(value) = message.value {
            self.handle_measurement(module_id, message, value);
        } else {
            self.stats.unresolved_topics.fetch_add(1, Ordering::Relaxed);
            debug!(module_id, topic = %message.topic, "message carries neither fragment nor value");
        }
    }

    fn handle_fragment(&self, module_id: &str, kind: FragmentKind, message: &Message) {
        let Some(metadata) = &message.metadata else {
            self.stats.dropped_readings.fetch_add(1, Ordering::Relaxed);
            warn!(module_id, topic = %message.topic, "status fragment without metadata");
            return;
        };
        let fragment = match StatusFragment::decode(kind, metadata) {
            Ok(fragment) => fragment,
            Err(error) => {
                self.stats.dropped_readings.fetch_add(1, Ordering::Relaxed);
                warn!(module_id, topic = %message.topic, %error, "undecodable status fragment");
                return;
            }
        };

        let handle = self.registry.get_or_create(module_id);
        apply_fragment(&mut handle.status.write(), &fragment, OffsetDateTime::now_utc());
        self.stats.fragments.fetch_add(1, Ordering::Relaxed);
        debug!(module_id, kind = ?fragment.kind(), "merged status fragment");
    }

    fn handle_measurement(&self, module_id: &str, message: &Message, value: f64) {
        let Some(key) = keys::resolve_topic(&message.topic) else {
            self.stats.unresolved_topics.fetch_add(1, Ordering::Relaxed);
            debug!(module_id, topic = %message.topic, "unresolvable measurement topic");
            return;
        };
        if !value.is_finite() {
            self.stats.dropped_readings.fetch_add(1, Ordering::Relaxed);
            warn!(module_id, key = %key, "non-finite reading dropped");
            return;
        }

        let handle = self.registry.get_or_create(module_id);
        handle.series.write().append(&key, SensorReading::new(message.time, value));
        record_measurement(&mut handle.status.write(), key.sensor_type(), value, message.time);

        self.stats.measurements.fetch_add(1, Ordering::Relaxed);
        debug!(module_id, key = %key, value, "appended measurement");
    }

    /// Merge a historical payload fetched from the upstream API.
    ///
    /// Every series batch is parsed before any state changes, so a
    /// malformed timestamp anywhere in the payload leaves the module
    /// untouched and the caller may refetch.
    pub fn load_dashboard(&self, module_id: &str, payload: &DashboardPayload) -> Result<(), TelemetryError> {
        if payload.status.is_none() && payload.sensors.is_empty() {
            return Err(TelemetryError::EmptyDashboard {
                module_id: module_id.to_owned(),
            });
        }

        let mut batches: Vec<(SensorKey, Vec<SensorReading>)> = Vec::new();
        for (raw_key, points) in &payload.sensors {
            let Some(key) = SensorKey::parse(raw_key) else {
                self.stats.unresolved_topics.fetch_add(1, Ordering::Relaxed);
                debug!(module_id, raw_key, "unresolvable historical channel key");
                continue;
            };
            batches.push((key, normalize_history(points)?));
        }

        let handle = self.registry.get_or_create(module_id);
        if let Some(status) = &payload.status {
            merge_dashboard_status(&mut handle.status.write(), status);
        }
        let mut series = handle.series.write();
        for (key, batch) in &batches {
            series.merge_historical(key, batch);
        }

        debug!(module_id, channels = batches.len(), "merged historical payload");
        Ok(())
    }

    /// Replace one channel's series wholesale, e.g. after a window
    /// change. Timestamps are validated up front like in
    /// [`load_dashboard`](Self::load_dashboard).
    pub fn replace_series(
        &self,
        module_id: &str,
        key: &SensorKey,
        points: &[RawPoint],
    ) -> Result<(), TelemetryError> {
        let batch = normalize_history(points)?;
        let handle = self.registry.get_or_create(module_id);
        handle.series.write().replace(key, batch);
        Ok(())
    }

    /// Stored series for a channel, honoring the bare-key fallback.
    pub fn series(&self, module_id: &str, key: &SensorKey) -> Option<Vec<SensorReading>> {
        let handle = self.registry.get(module_id)?;
        let series = handle.series.read();
        Some(series.get(key)?.as_slice().to_vec())
    }

    /// Current status snapshot of a module.
    pub fn device_status(&self, module_id: &str) -> Option<DeviceStatusSnapshot> {
        Some(self.registry.get(module_id)?.status_snapshot())
    }

    /// Connectivity classification for one channel at `now`.
    ///
    /// The last update comes from the series when present, otherwise
    /// from the sensor status table; the sampling interval from the
    /// channel's configuration entry.
    pub fn sensor_staleness(&self, module_id: &str, key: &SensorKey, now: OffsetDateTime) -> Connectivity {
        let Some(handle) = self.registry.get(module_id) else {
            return Connectivity::Unknown;
        };

        let interval = {
            let status = handle.status.read();
            status
                .sensors_config
                .get(key.sensor_type())
                .and_then(|config| config.interval)
                .unwrap_or(staleness::DEFAULT_INTERVAL_SECS)
        };

        let last_update = {
            let series = handle.series.read();
            match series.get(key).and_then(|buffer| buffer.last()) {
                Some(reading) => Some(reading.time),
                None => {
                    drop(series);
                    let status = handle.status.read();
                    status.sensors.get(key.sensor_type()).and_then(|s| s.last_update)
                }
            }
        };

        staleness::classify(last_update, interval, now)
    }

    /// Health band of a channel's latest value, when the sensor type
    /// has configured thresholds.
    pub fn current_band(&self, module_id: &str, key: &SensorKey) -> Option<HealthBand> {
        let handle = self.registry.get(module_id)?;
        let latest = {
            let series = handle.series.read();
            series.get(key)?.last()?.value
        };
        let threshold_key = key
            .hardware()
            .map(|hardware| format!("{hardware}:{}", key.sensor_type()))
            .unwrap_or_else(|| key.sensor_type().to_owned());
        thresholds::evaluate(&threshold_key, latest)
    }

    /// Channels with stored data for a module, annotated with the
    /// registry's display unit.
    pub fn channels(&self, module_id: &str) -> Vec<(SensorKey, &'static str)> {
        let Some(handle) = self.registry.get(module_id) else {
            return Vec::new();
        };
        let series = handle.series.read();
        series
            .keys()
            .map(|key| (key.clone(), registry::unit(key.sensor_type())))
            .collect()
    }

    pub fn module_ids(&self) -> Vec<String> {
        self.registry.module_ids()
    }

    pub fn stats(&self) -> IngestSnapshot {
        self.stats.snapshot()
    }
}

/// Parse a newest-first raw batch into ascending readings.
fn normalize_history(points: &[RawPoint]) -> Result<Vec<SensorReading>, TelemetryError> {
    let mut batch = Vec::with_capacity(points.len());
    for point in points.iter().rev() {
        let time = OffsetDateTime::parse(&point.time, &Rfc3339).map_err(|source| {
            TelemetryError::InvalidTimestamp {
                value: point.time.clone(),
                source,
            }
        })?;
        batch.push(SensorReading::new(time, point.value));
    }
    Ok(batch)
}
