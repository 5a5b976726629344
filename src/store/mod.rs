//! Fixed-capacity time-series storage
//!
//! One [`TimeSeriesStore`] holds every series observed from one admin endpoint.
//! All numeric series share a single cursor and a single timestamp table, so
//! slot `i` of any buffer and `timestamps[i]` always describe the same poll
//! cycle. Non-numeric observations are kept as scalars without history.
//!
//! # Cycle protocol
//! A poll cycle is: [`advance_cursor`](TimeSeriesStore::advance_cursor), then
//! [`record_timestamp`](TimeSeriesStore::record_timestamp), then the writes.
//! [`ingest_cycle`](TimeSeriesStore::ingest_cycle) performs all three; behind a
//! [`SharedStore`] it runs under one write lock, so readers never see a cursor
//! without its samples.
//!
//! # Kind conflicts
//! A key's kind is fixed by its first write. A later write of the other kind
//! is rejected with [`StoreError::KindConflict`] and the stored series is left
//! untouched.

mod buffer;
mod shared;

pub use buffer::{CircularBuffer, SlotRing, TimestampTable};
pub use shared::SharedStore;

use crate::types::{BufferSize, MetricKey, MetricSample, SampleValue};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Storage kind of a series, fixed at first write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// Buffered integer samples
    Numeric,
    /// Latest text value only
    Scalar,
}

impl SeriesKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Scalar => "scalar",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("series {key} is {existing}, rejecting {attempted} write")]
    KindConflict {
        key: String,
        existing: SeriesKind,
        attempted: SeriesKind,
    },

    #[error("unknown series {0}")]
    UnknownSeries(String),

    #[error("no poll cycle has started yet")]
    NoActiveCycle,
}

/// Copied-out current value of a series
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatValue {
    Numeric(i64),
    Scalar(String),
    /// Numeric series with no sample in the current cycle
    Unset,
}

impl StatValue {
    /// Numeric value, if any
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Numeric(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{}", value),
            Self::Scalar(text) => f.write_str(text),
            Self::Unset => f.write_str("-"),
        }
    }
}

/// Outcome of one ingested poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Slot the cycle was written to
    pub cursor: usize,
    /// Samples accepted
    pub written: usize,
    /// Samples rejected because of a kind conflict
    pub conflicts: usize,
}

#[derive(Debug, Clone)]
enum Series {
    Numeric(CircularBuffer),
    Scalar(String),
}

/// Read-only view of one numeric series, anchored at the store's cursor
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    pub samples: &'a CircularBuffer,
    pub timestamps: &'a TimestampTable,
    /// Most recently written slot
    pub cursor: usize,
}

impl BufferView<'_> {
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }
}

/// Circular-buffer store keyed by a metric key shape
#[derive(Debug, Clone)]
pub struct TimeSeriesStore<K> {
    capacity: BufferSize,
    /// `None` until the first cycle starts
    cursor: Option<usize>,
    timestamps: TimestampTable,
    series: HashMap<K, Series>,
    cycles: u64,
}

impl<K: MetricKey> TimeSeriesStore<K> {
    /// Create an empty store; the capacity is fixed for the store's lifetime
    #[must_use]
    pub fn new(capacity: BufferSize) -> Self {
        Self {
            capacity,
            cursor: None,
            timestamps: TimestampTable::new(capacity.get()),
            series: HashMap::new(),
            cycles: 0,
        }
    }

    /// Slots per buffer
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Slot of the most recent cycle, `None` before the first one
    #[must_use]
    #[inline]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of completed cycles
    #[must_use]
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of known series
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Start a new cycle: move the cursor one slot and return it
    ///
    /// The slot being reused is cleared in the timestamp table and in every
    /// numeric buffer, so a key missing from this cycle reads as unset rather
    /// than as the value from `capacity` cycles ago.
    pub fn advance_cursor(&mut self) -> usize {
        let next = match self.cursor {
            Some(cursor) => (cursor + 1) % self.capacity(),
            None => 0,
        };
        self.cursor = Some(next);
        self.cycles += 1;
        self.timestamps.clear(next);
        for series in self.series.values_mut() {
            if let Series::Numeric(buffer) = series {
                buffer.clear(next);
            }
        }
        next
    }

    /// Label the current cycle with its capture time
    pub fn record_timestamp(&mut self, label: impl Into<String>) -> Result<(), StoreError> {
        let cursor = self.active_cursor()?;
        self.timestamps.set(cursor, label.into());
        Ok(())
    }

    /// Write a numeric sample for `key` at the current cursor
    ///
    /// Creates the buffer on first observation.
    pub fn write_numeric(&mut self, key: K, value: i64) -> Result<(), StoreError> {
        let cursor = self.active_cursor()?;
        let capacity = self.capacity();

        match self.series.entry(key) {
            Entry::Occupied(mut entry) => {
                if let Series::Numeric(buffer) = entry.get_mut() {
                    buffer.set(cursor, value);
                    return Ok(());
                }
                Err(StoreError::KindConflict {
                    key: entry.key().to_string(),
                    existing: SeriesKind::Scalar,
                    attempted: SeriesKind::Numeric,
                })
            }
            Entry::Vacant(entry) => {
                let mut buffer = CircularBuffer::new(capacity);
                buffer.set(cursor, value);
                entry.insert(Series::Numeric(buffer));
                Ok(())
            }
        }
    }

    /// Overwrite the scalar value for `key`, creating it on first observation
    pub fn write_scalar(&mut self, key: K, value: impl Into<String>) -> Result<(), StoreError> {
        match self.series.entry(key) {
            Entry::Occupied(mut entry) => {
                if let Series::Scalar(text) = entry.get_mut() {
                    *text = value.into();
                    return Ok(());
                }
                Err(StoreError::KindConflict {
                    key: entry.key().to_string(),
                    existing: SeriesKind::Numeric,
                    attempted: SeriesKind::Scalar,
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(Series::Scalar(value.into()));
                Ok(())
            }
        }
    }

    /// Apply a whole poll cycle: advance, timestamp, then every sample
    ///
    /// Conflicting samples are logged and skipped; they never abort the cycle.
    pub fn ingest_cycle(
        &mut self,
        label: impl Into<String>,
        samples: impl IntoIterator<Item = MetricSample<K>>,
    ) -> IngestReport {
        let cursor = self.advance_cursor();
        self.timestamps.set(cursor, label.into());

        let mut report = IngestReport {
            cursor,
            ..IngestReport::default()
        };

        for sample in samples {
            let result = match sample.value {
                SampleValue::Numeric(value) => self.write_numeric(sample.key, value),
                SampleValue::Scalar(text) => self.write_scalar(sample.key, text),
            };
            match result {
                Ok(()) => report.written += 1,
                Err(e) => {
                    warn!("Ignoring sample: {}", e);
                    report.conflicts += 1;
                }
            }
        }

        report
    }

    /// Current value: the sample at the cursor, or the scalar text
    pub fn current_value(&self, key: &K) -> Result<StatValue, StoreError> {
        match self.series.get(key) {
            None => Err(StoreError::UnknownSeries(key.to_string())),
            Some(Series::Scalar(text)) => Ok(StatValue::Scalar(text.clone())),
            Some(Series::Numeric(buffer)) => Ok(self
                .cursor
                .and_then(|cursor| buffer.sample(cursor))
                .map_or(StatValue::Unset, StatValue::Numeric)),
        }
    }

    /// Distinct next segments of all keys below `prefix`, sorted
    ///
    /// With an empty prefix this lists the top level; with a two-segment
    /// prefix on cluster keys it lists stat names.
    #[must_use]
    pub fn keys_under(&self, prefix: &[&str]) -> BTreeSet<String> {
        self.series
            .keys()
            .filter(|key| key.starts_with(prefix))
            .filter_map(|key| key.segments().get(prefix.len()).map(|s| s.to_string()))
            .collect()
    }

    /// Iterate over every known key (unordered)
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.series.keys()
    }

    /// Storage kind of `key`, if known
    #[must_use]
    pub fn kind(&self, key: &K) -> Option<SeriesKind> {
        self.series.get(key).map(|series| match series {
            Series::Numeric(_) => SeriesKind::Numeric,
            Series::Scalar(_) => SeriesKind::Scalar,
        })
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.series.contains_key(key)
    }

    /// Read-only view of a numeric series for the series algorithms
    ///
    /// `None` for unknown keys, scalar keys, or before the first cycle.
    #[must_use]
    pub fn raw_buffer(&self, key: &K) -> Option<BufferView<'_>> {
        let cursor = self.cursor?;
        match self.series.get(key)? {
            Series::Numeric(samples) => Some(BufferView {
                samples,
                timestamps: &self.timestamps,
                cursor,
            }),
            Series::Scalar(_) => None,
        }
    }

    /// Capture label of slot `idx`
    #[must_use]
    pub fn timestamp(&self, idx: usize) -> Option<&str> {
        self.timestamps.get(idx).map(String::as_str)
    }

    fn active_cursor(&self) -> Result<usize, StoreError> {
        self.cursor.ok_or(StoreError::NoActiveCycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClusterKey, FlatKey};

    fn store(capacity: usize) -> TimeSeriesStore<FlatKey> {
        TimeSeriesStore::new(BufferSize::new(capacity).unwrap())
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = store(20);
        assert!(store.is_empty());
        assert_eq!(store.cursor(), None);
        assert_eq!(store.capacity(), 20);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut store = store(3);
        assert_eq!(store.advance_cursor(), 0);
        assert_eq!(store.advance_cursor(), 1);
        assert_eq!(store.advance_cursor(), 2);
        assert_eq!(store.advance_cursor(), 0);
        assert_eq!(store.cycles(), 4);
    }

    #[test]
    fn test_write_before_first_cycle_rejected() {
        let mut store = store(3);
        assert_eq!(
            store.write_numeric(FlatKey::new("a"), 1),
            Err(StoreError::NoActiveCycle)
        );
        assert_eq!(
            store.record_timestamp("12:00:00"),
            Err(StoreError::NoActiveCycle)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_numeric_round_trip() {
        let mut store = store(3);
        store.advance_cursor();
        store.write_numeric(FlatKey::new("server.uptime"), 42).unwrap();

        assert_eq!(
            store.current_value(&FlatKey::new("server.uptime")),
            Ok(StatValue::Numeric(42))
        );
        assert_eq!(
            store.kind(&FlatKey::new("server.uptime")),
            Some(SeriesKind::Numeric)
        );
    }

    #[test]
    fn test_scalar_overwrites_in_place() {
        let mut store = store(3);
        store.write_scalar(FlatKey::new("v"), "1.0").unwrap();
        store.write_scalar(FlatKey::new("v"), "1.1").unwrap();
        assert_eq!(
            store.current_value(&FlatKey::new("v")),
            Ok(StatValue::Scalar("1.1".to_string()))
        );
        assert!(store.raw_buffer(&FlatKey::new("v")).is_none());
    }

    #[test]
    fn test_unknown_series() {
        let store = store(3);
        assert_eq!(
            store.current_value(&FlatKey::new("missing")),
            Err(StoreError::UnknownSeries("missing".to_string()))
        );
        assert!(store.raw_buffer(&FlatKey::new("missing")).is_none());
    }

    #[test]
    fn test_numeric_then_scalar_conflict_preserves_buffer() {
        let mut store = store(3);
        store.advance_cursor();
        store.write_numeric(FlatKey::new("k"), 5).unwrap();

        let err = store.write_scalar(FlatKey::new("k"), "oops").unwrap_err();
        assert_eq!(
            err,
            StoreError::KindConflict {
                key: "k".to_string(),
                existing: SeriesKind::Numeric,
                attempted: SeriesKind::Scalar,
            }
        );
        assert_eq!(
            store.current_value(&FlatKey::new("k")),
            Ok(StatValue::Numeric(5))
        );
    }

    #[test]
    fn test_scalar_then_numeric_conflict() {
        let mut store = store(3);
        store.advance_cursor();
        store.write_scalar(FlatKey::new("k"), "text").unwrap();
        assert!(matches!(
            store.write_numeric(FlatKey::new("k"), 1),
            Err(StoreError::KindConflict {
                existing: SeriesKind::Scalar,
                ..
            })
        ));
        assert_eq!(store.kind(&FlatKey::new("k")), Some(SeriesKind::Scalar));
    }

    #[test]
    fn test_missing_key_reads_unset_after_advance() {
        let mut store = store(3);
        store.advance_cursor();
        store.write_numeric(FlatKey::new("k"), 7).unwrap();
        store.advance_cursor();

        assert_eq!(store.current_value(&FlatKey::new("k")), Ok(StatValue::Unset));
    }

    #[test]
    fn test_reused_slot_is_cleared() {
        let mut store = store(3);
        store.ingest_cycle("t0", [MetricSample::numeric(FlatKey::new("k"), 1)]);
        store.ingest_cycle("t1", []);
        store.ingest_cycle("t2", []);
        // Wraps back to slot 0; the old sample must not leak into this cycle
        store.ingest_cycle("t3", []);

        assert_eq!(store.cursor(), Some(0));
        assert_eq!(store.current_value(&FlatKey::new("k")), Ok(StatValue::Unset));
        assert_eq!(store.timestamp(0), Some("t3"));
    }

    #[test]
    fn test_ingest_cycle_report() {
        let mut store = store(3);
        store.ingest_cycle("t0", [MetricSample::scalar(FlatKey::new("v"), "x")]);
        let report = store.ingest_cycle(
            "t1",
            [
                MetricSample::numeric(FlatKey::new("a"), 1),
                MetricSample::numeric(FlatKey::new("v"), 2),
                MetricSample::scalar(FlatKey::new("v"), "y"),
            ],
        );

        assert_eq!(
            report,
            IngestReport {
                cursor: 1,
                written: 2,
                conflicts: 1,
            }
        );
        assert_eq!(store.timestamp(1), Some("t1"));
    }

    #[test]
    fn test_keys_under_cluster_hierarchy() {
        let mut store: TimeSeriesStore<ClusterKey> =
            TimeSeriesStore::new(BufferSize::new(3).unwrap());
        store.advance_cursor();
        store
            .write_numeric(ClusterKey::new("a", "10.0.0.1:80", "rq_total"), 1)
            .unwrap();
        store
            .write_numeric(ClusterKey::new("a", "10.0.0.1:80", "cx_active"), 1)
            .unwrap();
        store
            .write_numeric(ClusterKey::new("a", "10.0.0.2:80", "rq_total"), 1)
            .unwrap();
        store
            .write_scalar(ClusterKey::new("b", "default_priority", "max_connections"), "x")
            .unwrap();

        let top: Vec<_> = store.keys_under(&[]).into_iter().collect();
        assert_eq!(top, vec!["a", "b"]);

        let hosts: Vec<_> = store.keys_under(&["a"]).into_iter().collect();
        assert_eq!(hosts, vec!["10.0.0.1:80", "10.0.0.2:80"]);

        let stats: Vec<_> = store
            .keys_under(&["a", "10.0.0.1:80"])
            .into_iter()
            .collect();
        assert_eq!(stats, vec!["cx_active", "rq_total"]);

        assert!(store.keys_under(&["a", "10.0.0.1:80", "rq_total"]).is_empty());
        assert!(store.keys_under(&["zzz"]).is_empty());
    }

    #[test]
    fn test_stat_value_display() {
        assert_eq!(StatValue::Numeric(3).to_string(), "3");
        assert_eq!(StatValue::Scalar("ok".into()).to_string(), "ok");
        assert_eq!(StatValue::Unset.to_string(), "-");
    }
}
