use std::collections::VecDeque;

use crate::models::Reading;

/// Maximum number of readings retained.
pub const READING_RETENTION: usize = 500;

/// Bounded history of readings, most recent first.
///
/// Guarantees ordering and the retention cap only; filtering is left to the
/// consumer through [`ReadingStore::query`].
#[derive(Debug, Clone)]
pub struct ReadingStore {
    inner: VecDeque<Reading>,
    capacity: usize,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::with_capacity(READING_RETENTION)
    }
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert at the head, evicting from the tail past the cap.
    pub fn append(&mut self, reading: Reading) {
        self.inner.push_front(reading);
        self.inner.truncate(self.capacity);
    }

    /// Discard everything and take `readings` (expected most-recent-first).
    pub fn replace_all(&mut self, readings: impl IntoIterator<Item = Reading>) {
        self.inner = readings.into_iter().take(self.capacity).collect();
    }

    /// Lazy view of the readings matching `predicate`, most recent first.
    pub fn query<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Reading> + 'a
    where
        P: Fn(&Reading) -> bool + 'a,
    {
        self.inner.iter().filter(move |r| predicate(*r))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.inner.iter()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.inner.front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::MotorStatus;

    fn make_reading(n: i64) -> Reading {
        Reading {
            id: format!("reading-{n}"),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(15 * n),
            temperature: 37.5,
            humidity: 60.0,
            egg_turning: n % 32 == 0,
            motor_status: MotorStatus::Idle,
        }
    }

    #[test]
    fn empty_store_returns_nothing() {
        let store = ReadingStore::new();
        assert!(store.is_empty());
        assert!(store.latest().is_none());
        assert_eq!(store.query(|_| true).count(), 0);
    }

    #[test]
    fn append_puts_newest_first() {
        let mut store = ReadingStore::new();
        store.append(make_reading(1));
        store.append(make_reading(2));

        let ids: Vec<_> = store.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["reading-2", "reading-1"]);
        assert_eq!(store.latest().unwrap().id, "reading-2");
    }

    #[test]
    fn retention_cap_evicts_oldest() {
        let mut store = ReadingStore::new();
        for n in 1..=501 {
            store.append(make_reading(n));
        }

        assert_eq!(store.len(), READING_RETENTION);
        assert_eq!(store.latest().unwrap().id, "reading-501");
        assert!(store.iter().all(|r| r.id != "reading-1"));
        assert_eq!(store.iter().last().unwrap().id, "reading-2");
    }

    #[test]
    fn replace_all_discards_previous_contents() {
        let mut store = ReadingStore::new();
        store.append(make_reading(1));
        store.replace_all(vec![make_reading(10), make_reading(9)]);

        let ids: Vec<_> = store.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["reading-10", "reading-9"]);
    }

    #[test]
    fn replace_all_respects_cap() {
        let mut store = ReadingStore::with_capacity(3);
        store.replace_all((0..10).rev().map(make_reading));
        assert_eq!(store.len(), 3);
        assert_eq!(store.latest().unwrap().id, "reading-9");
    }

    #[test]
    fn query_filters_lazily_in_order() {
        let mut store = ReadingStore::new();
        for n in 0..=64 {
            store.append(make_reading(n));
        }

        let turning: Vec<_> = store.query(|r| r.egg_turning).map(|r| r.id.as_str()).collect();
        assert_eq!(turning, ["reading-64", "reading-32", "reading-0"]);
    }
}
