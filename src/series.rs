//! Chart-ready series computed from a circular buffer
//!
//! Both walks start one slot after the cursor (the oldest slot) and move
//! towards the cursor, so points come out oldest-to-newest. They are pure
//! functions of the buffer and allocate a fresh [`Series`] on every call.

use crate::store::BufferView;

/// One chart point: capture label and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
    pub timestamp: String,
    pub value: i64,
}

/// Ordered points, oldest first; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    /// Wrap points, returning `None` for "no data"
    #[must_use]
    pub fn from_points(points: Vec<SeriesPoint>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Values only, oldest first
    #[must_use]
    pub fn values(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Capture labels only, oldest first
    #[must_use]
    pub fn timestamps(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.timestamp.as_str()).collect()
    }

    /// Most recent point
    #[must_use]
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// (x, y) pairs for a chart, x being the point's position
    #[must_use]
    pub fn chart_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .map(|(x, p)| (x as f64, p.value as f64))
            .collect()
    }

    /// Largest value, for axis scaling
    #[must_use]
    pub fn max_value(&self) -> i64 {
        self.points.iter().map(|p| p.value).max().unwrap_or(0)
    }

    /// Smallest value, for axis scaling
    #[must_use]
    pub fn min_value(&self) -> i64 {
        self.points.iter().map(|p| p.value).min().unwrap_or(0)
    }
}

/// Slot visited at step `i` of a walk anchored at `cursor`
#[inline]
fn slot(i: usize, cursor: usize, capacity: usize) -> usize {
    (i + cursor) % capacity
}

/// Slot preceding `idx`, wrapping below zero
#[inline]
fn previous_slot(idx: usize, capacity: usize) -> usize {
    (idx + capacity - 1) % capacity
}

/// Rate-of-change series: difference between each sample and its predecessor
///
/// Visits steps `2..capacity`. A point is emitted only when both the slot and
/// its predecessor are set and the difference fits in an `i64`; an unset
/// predecessor drops the point instead of treating it as zero.
#[must_use]
pub fn compute_delta_series(view: &BufferView<'_>) -> Option<Series> {
    let capacity = view.capacity();
    let points = (2..capacity)
        .map(|i| slot(i, view.cursor, capacity))
        .filter_map(|idx| {
            let current = view.samples.sample(idx)?;
            let previous = view.samples.sample(previous_slot(idx, capacity))?;
            let timestamp = view.timestamps.get(idx)?;
            Some(SeriesPoint {
                timestamp: timestamp.clone(),
                value: current.checked_sub(previous)?,
            })
        })
        .collect();

    Series::from_points(points)
}

/// Gauge series: the raw samples, undifferenced
///
/// Visits steps `1..capacity` and emits every set slot.
#[must_use]
pub fn compute_gauge_series(view: &BufferView<'_>) -> Option<Series> {
    let capacity = view.capacity();
    let points = (1..capacity)
        .map(|i| slot(i, view.cursor, capacity))
        .filter_map(|idx| {
            Some(SeriesPoint {
                timestamp: view.timestamps.get(idx)?.clone(),
                value: view.samples.sample(idx)?,
            })
        })
        .collect();

    Series::from_points(points)
}

/// Difference between the two most recent samples (the cursor and the slot
/// before it), as printed by the headless watcher
#[must_use]
pub fn compute_latest_delta(view: &BufferView<'_>) -> Option<i64> {
    let current = view.samples.sample(view.cursor)?;
    let previous = view
        .samples
        .sample(previous_slot(view.cursor, view.capacity()))?;
    current.checked_sub(previous)
}
