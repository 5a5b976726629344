//! Fixed-capacity slot rings
//!
//! A slot stays `None` until a poll cycle writes it. Readers skip unset slots;
//! they are never read as zero.

/// Fixed-capacity ring of optional slots, indexed `0..capacity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRing<T> {
    slots: Box<[Option<T>]>,
}

/// Numeric samples of one series
pub type CircularBuffer = SlotRing<i64>;

/// Capture-time labels, shared by every series in a store
pub type TimestampTable = SlotRing<String>;

impl<T> SlotRing<T> {
    /// Create a ring with every slot unset
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Number of slots
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Borrow the value at `idx`, `None` when unset or out of range
    #[must_use]
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    /// Store `value` at `idx` (ignored when out of range)
    #[inline]
    pub fn set(&mut self, idx: usize, value: T) {
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = Some(value);
        }
    }

    /// Mark `idx` unset again
    #[inline]
    pub fn clear(&mut self, idx: usize) {
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = None;
        }
    }

    /// Whether `idx` holds a value
    #[must_use]
    #[inline]
    pub fn is_set(&self, idx: usize) -> bool {
        self.get(idx).is_some()
    }

    /// Number of set slots
    #[must_use]
    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl CircularBuffer {
    /// Copy out the sample at `idx`
    #[must_use]
    #[inline]
    pub fn sample(&self, idx: usize) -> Option<i64> {
        self.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring_is_unset() {
        let ring: CircularBuffer = SlotRing::new(4);
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.filled(), 0);
        assert!((0..4).all(|i| !ring.is_set(i)));
    }

    #[test]
    fn test_set_get_clear() {
        let mut ring: CircularBuffer = SlotRing::new(3);
        ring.set(1, 42);
        assert_eq!(ring.sample(1), Some(42));
        assert_eq!(ring.sample(0), None);

        ring.clear(1);
        assert_eq!(ring.sample(1), None);
    }

    #[test]
    fn test_zero_is_a_value() {
        let mut ring: CircularBuffer = SlotRing::new(3);
        ring.set(2, 0);
        assert!(ring.is_set(2));
        assert_eq!(ring.filled(), 1);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut ring: TimestampTable = SlotRing::new(2);
        ring.set(5, "12:00:00".to_string());
        assert_eq!(ring.filled(), 0);
        assert_eq!(ring.get(5), None);
    }
}
