//! Bounded, deduplicated time series per sensor channel.
//!
//! Two delivery channels feed the same buffer: the live push channel
//! appends one point at a time, the historical channel merges whole
//! batches when a dashboard opens or changes its time window. Live
//! data is authoritative for a given instant; historical backfill
//! only fills the gaps.

use std::collections::BTreeMap;

use aerosync_api::keys::SensorKey;
use aerosync_api::models::SensorReading;

/// Tolerance window for timestamp-bucket deduplication. Two points
/// whose timestamps round to the same window are the same instant.
pub const DEDUP_TOLERANCE_MS: i64 = 1000;

/// Round a unix-ms timestamp half-up to its dedup bucket.
fn bucket_key(unix_ms: i64) -> i64 {
    (unix_ms + DEDUP_TOLERANCE_MS / 2).div_euclid(DEDUP_TOLERANCE_MS) * DEDUP_TOLERANCE_MS
}

/// Bounded, time-ordered history for one measurement channel.
///
/// Invariants: entries ascend by time, `len() <= capacity`, and
/// eviction always removes the oldest entry regardless of which
/// channel contributed it.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: Vec<SensorReading>,
    capacity: usize,
}

impl SeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Entries in non-decreasing time order.
    pub fn as_slice(&self) -> &[SensorReading] {
        &self.points
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&SensorReading> {
        self.points.last()
    }

    /// Append a live point, keeping time order.
    ///
    /// Live feeds are usually monotonic, so the common case is a push
    /// at the tail, but insertion goes by timestamp to stay correct
    /// under late delivery. Non-finite values are ignored; the return
    /// value tells the caller whether the point was stored.
    pub fn append(&mut self, reading: SensorReading) -> bool {
        if !reading.value.is_finite() {
            return false;
        }

        let index = self.points.partition_point(|p| p.time <= reading.time);
        self.points.insert(index, reading);

        if self.points.len() > self.capacity {
            self.points.remove(0);
        }

        true
    }

    /// Merge a historical batch with timestamp-bucket deduplication.
    ///
    /// Points already in the buffer claim their bucket first (within
    /// that pass the latest actual timestamp wins); batch points only
    /// fill vacant buckets. The result is re-sorted ascending and
    /// truncated to the most recent `capacity` entries. Merging the
    /// same batch twice is a no-op the second time.
    pub fn merge_historical(&mut self, batch: &[SensorReading]) {
        if batch.is_empty() {
            return;
        }

        let mut buckets: BTreeMap<i64, SensorReading> = BTreeMap::new();

        for point in &self.points {
            let kept = buckets.entry(bucket_key(point.unix_ms())).or_insert(*point);
            if kept.unix_ms() < point.unix_ms() {
                *kept = *point;
            }
        }

        for point in batch {
            if !point.value.is_finite() {
                continue;
            }
            buckets.entry(bucket_key(point.unix_ms())).or_insert(*point);
        }

        let mut merged: Vec<SensorReading> = buckets.into_values().collect();
        merged.sort_by_key(|p| p.time);
        if merged.len() > self.capacity {
            merged.drain(..merged.len() - self.capacity);
        }

        self.points = merged;
    }

    /// Replace the whole series, bypassing dedup. Used when a
    /// consumer reloads a different time window. Ordering and
    /// capacity invariants still hold.
    pub fn replace(&mut self, mut series: Vec<SensorReading>) {
        series.retain(|p| p.value.is_finite());
        series.sort_by_key(|p| p.time);
        if series.len() > self.capacity {
            series.drain(..series.len() - self.capacity);
        }

        self.points = series;
    }
}

/// All series buffers of one module, keyed by sensor channel.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    series: BTreeMap<SensorKey, SeriesBuffer>,
    capacity: usize,
}

impl SeriesStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: BTreeMap::new(),
            capacity,
        }
    }

    fn buffer_mut(&mut self, key: &SensorKey) -> &mut SeriesBuffer {
        self.series
            .entry(key.clone())
            .or_insert_with(|| SeriesBuffer::new(self.capacity))
    }

    pub fn append(&mut self, key: &SensorKey, reading: SensorReading) -> bool {
        self.buffer_mut(key).append(reading)
    }

    pub fn merge_historical(&mut self, key: &SensorKey, batch: &[SensorReading]) {
        self.buffer_mut(key).merge_historical(batch);
    }

    pub fn replace(&mut self, key: &SensorKey, series: Vec<SensorReading>) {
        self.buffer_mut(key).replace(series);
    }

    /// Buffer for a channel, with legacy fallback.
    ///
    /// A bare key whose own entry is absent or empty falls back to a
    /// composite entry of the same sensor type, but only when exactly
    /// one non-empty candidate exists. A hardware-qualified key never
    /// falls back.
    pub fn get(&self, key: &SensorKey) -> Option<&SeriesBuffer> {
        if let Some(buffer) = self.series.get(key) {
            if !buffer.is_empty() {
                return Some(buffer);
            }
        }
        if key.is_composite() {
            return None;
        }

        let mut candidates = self.series.iter().filter(|(candidate, buffer)| {
            candidate.is_composite()
                && candidate.sensor_type() == key.sensor_type()
                && !buffer.is_empty()
        });
        let (_, buffer) = candidates.next()?;
        if candidates.next().is_some() {
            // ambiguous: two hardware channels measure this type
            return None;
        }

        Some(buffer)
    }

    /// Channel keys with stored data.
    pub fn keys(&self) -> impl Iterator<Item = &SensorKey> {
        self.series
            .iter()
            .filter(|(_, buffer)| !buffer.is_empty())
            .map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use time::Duration;
    use time::macros::datetime;

    use super::*;

    const T0: time::OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

    fn reading(offset_ms: i64, value: f64) -> SensorReading {
        SensorReading::new(T0 + Duration::milliseconds(offset_ms), value)
    }

    fn key(raw: &str) -> SensorKey {
        SensorKey::parse(raw).unwrap()
    }

    #[test]
    fn test_append_keeps_time_order_under_late_delivery() {
        let mut buffer = SeriesBuffer::new(10);
        assert!(buffer.append(reading(0, 1.0)));
        assert!(buffer.append(reading(5000, 3.0)));
        assert!(buffer.append(reading(2000, 2.0)));

        let values: Vec<f64> = buffer.as_slice().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_append_evicts_oldest_beyond_capacity() {
        let mut buffer = SeriesBuffer::new(3);
        for i in 0..5 {
            buffer.append(reading(i * 1000, i as f64));
        }

        assert_eq!(buffer.len(), 3);
        let values: Vec<f64> = buffer.as_slice().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_append_rejects_non_finite_values() {
        let mut buffer = SeriesBuffer::new(10);
        assert!(!buffer.append(reading(0, f64::NAN)));
        assert!(!buffer.append(reading(0, f64::INFINITY)));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_merge_empty_batch_is_a_noop() {
        let mut buffer = SeriesBuffer::new(10);
        buffer.append(reading(0, 1.0));
        buffer.merge_historical(&[]);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_merge_live_point_wins_its_bucket() {
        let mut buffer = SeriesBuffer::new(10);
        buffer.append(reading(0, 1200.0));

        // within the 1000ms tolerance of the live point
        buffer.merge_historical(&[reading(-900, 1150.0), reading(-5000, 900.0)]);

        let values: Vec<f64> = buffer.as_slice().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![900.0, 1200.0]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut buffer = SeriesBuffer::new(10);
        buffer.append(reading(0, 10.0));
        let batch = vec![reading(-3000, 7.0), reading(-6000, 5.0)];

        buffer.merge_historical(&batch);
        let first: Vec<SensorReading> = buffer.as_slice().to_vec();

        buffer.merge_historical(&batch);
        assert_eq!(buffer.as_slice(), first.as_slice());
    }

    #[test]
    fn test_merge_truncates_to_most_recent() {
        let mut buffer = SeriesBuffer::new(3);
        buffer.append(reading(10_000, 99.0));

        let batch: Vec<SensorReading> = (0..6).map(|i| reading(i * 2000, i as f64)).collect();
        buffer.merge_historical(&batch);

        assert_eq!(buffer.len(), 3);
        // newest three by time survive, live point included
        let values: Vec<f64> = buffer.as_slice().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 99.0]);
    }

    #[test]
    fn test_merge_dedups_within_existing_points() {
        let mut buffer = SeriesBuffer::new(10);
        // two live points 300ms apart share a bucket; latest wins
        buffer.append(reading(100, 1.0));
        buffer.append(reading(400, 2.0));
        buffer.merge_historical(&[reading(7000, 3.0)]);

        let values: Vec<f64> = buffer.as_slice().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_replace_bypasses_dedup_but_keeps_invariants() {
        let mut buffer = SeriesBuffer::new(2);
        buffer.append(reading(0, 1.0));

        buffer.replace(vec![reading(900, 10.0), reading(300, 20.0), reading(600, 30.0)]);

        let values: Vec<f64> = buffer.as_slice().iter().map(|p| p.value).collect();
        // sorted ascending, truncated to newest two, old content gone
        assert_eq!(values, vec![30.0, 10.0]);
    }

    #[test]
    fn test_store_bare_key_falls_back_to_single_composite() {
        let mut store = SeriesStore::new(10);
        store.append(&key("bme280:temperature"), reading(0, 21.5));

        let buffer = store.get(&key("temperature")).unwrap();
        assert_eq!(buffer.last().unwrap().value, 21.5);
    }

    #[test]
    fn test_store_no_fallback_when_ambiguous() {
        let mut store = SeriesStore::new(10);
        store.append(&key("bme280:temperature"), reading(0, 21.5));
        store.append(&key("dht22:temperature"), reading(0, 22.0));

        assert!(store.get(&key("temperature")).is_none());
    }

    #[test]
    fn test_store_composite_key_never_falls_back() {
        let mut store = SeriesStore::new(10);
        store.append(&key("bme280:temperature"), reading(0, 21.5));

        assert!(store.get(&key("dht22:temperature")).is_none());
    }

    #[test]
    fn test_store_prefers_exact_entry_over_fallback() {
        let mut store = SeriesStore::new(10);
        store.append(&key("temperature"), reading(0, 19.0));
        store.append(&key("bme280:temperature"), reading(0, 21.5));

        let buffer = store.get(&key("temperature")).unwrap();
        assert_eq!(buffer.last().unwrap().value, 19.0);
    }
}
