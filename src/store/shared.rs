//! Shared handle to a store: one writer (the poller), many copy-out readers

use std::sync::{Arc, PoisonError, RwLock};

use super::{IngestReport, TimeSeriesStore};
use crate::types::{BufferSize, MetricKey, MetricSample};

/// Cheaply cloneable handle to one [`TimeSeriesStore`]
///
/// Each ingested cycle is applied under a single write lock, so a reader
/// either sees the whole cycle or none of it. Readers get a shared borrow only
/// for the duration of the closure passed to [`read`](Self::read).
#[derive(Debug)]
pub struct SharedStore<K> {
    inner: Arc<RwLock<TimeSeriesStore<K>>>,
}

impl<K> Clone for SharedStore<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: MetricKey> SharedStore<K> {
    /// Create an empty shared store
    #[must_use]
    pub fn new(capacity: BufferSize) -> Self {
        Self::from_store(TimeSeriesStore::new(capacity))
    }

    /// Wrap an existing store
    #[must_use]
    pub fn from_store(store: TimeSeriesStore<K>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run `f` against the store under a read lock
    ///
    /// Return owned data from `f`; nothing borrowed from the store may escape.
    pub fn read<R>(&self, f: impl FnOnce(&TimeSeriesStore<K>) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Apply one complete poll cycle atomically
    pub fn ingest(
        &self,
        label: impl Into<String>,
        samples: impl IntoIterator<Item = MetricSample<K>>,
    ) -> IngestReport {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.ingest_cycle(label, samples)
    }

    /// Current cursor
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.read(TimeSeriesStore::cursor)
    }

    /// Slots per buffer
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.read(TimeSeriesStore::capacity)
    }

    /// Completed cycles
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.read(TimeSeriesStore::cycles)
    }
}
