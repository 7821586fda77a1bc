//! Ordered event store backing the editor timeline and session loading.
//!
//! Events are keyed by their millisecond timestamp. Several events may share
//! a timestamp; they keep their insertion order within that key.

use super::event::MuseEvent;
use std::collections::BTreeMap;
use std::ops::RangeBounds;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedEventStore {
    events: BTreeMap<i64, Vec<MuseEvent>>,
    len: usize,
}

impl OrderedEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an event under its own timestamp.
    pub fn insert(&mut self, event: MuseEvent) {
        self.events
            .entry(event.timestamp_ms)
            .or_default()
            .push(event);
        self.len += 1;
    }

    /// Inserts an event at `index` among those sharing its timestamp,
    /// clamped to the end of that group.
    pub fn insert_at(&mut self, event: MuseEvent, index: usize) {
        let bucket = self.events.entry(event.timestamp_ms).or_default();
        bucket.insert(index.min(bucket.len()), event);
        self.len += 1;
    }

    /// Removes the first event at `time_ms` whose kind equals `kind`.
    ///
    /// Every entry stored at that key is scanned, not only the first one.
    pub fn remove(&mut self, time_ms: i64, kind: &str) -> Option<MuseEvent> {
        self.remove_indexed(time_ms, kind).map(|(_, event)| event)
    }

    /// Like `remove`, also returning the position the event had among
    /// those sharing its timestamp.
    pub fn remove_indexed(&mut self, time_ms: i64, kind: &str) -> Option<(usize, MuseEvent)> {
        let bucket = self.events.get_mut(&time_ms)?;
        let idx = bucket.iter().position(|e| e.kind == kind)?;
        let removed = bucket.remove(idx);
        if bucket.is_empty() {
            self.events.remove(&time_ms);
        }
        self.len -= 1;
        Some((idx, removed))
    }

    pub fn contains(&self, time_ms: i64, kind: &str) -> bool {
        self.events
            .get(&time_ms)
            .is_some_and(|bucket| bucket.iter().any(|e| e.kind == kind))
    }

    /// Events whose timestamp falls in `range`, ascending.
    pub fn range<R>(&self, range: R) -> impl Iterator<Item = &MuseEvent>
    where
        R: RangeBounds<i64>,
    {
        self.events.range(range).flat_map(|(_, bucket)| bucket.iter())
    }

    /// All events, ascending by timestamp.
    pub fn iter(&self) -> impl Iterator<Item = &MuseEvent> {
        self.events.values().flatten()
    }

    /// Smallest timestamp in the store.
    pub fn first_time(&self) -> Option<i64> {
        self.events.keys().next().copied()
    }

    /// Largest timestamp in the store.
    pub fn last_time(&self) -> Option<i64> {
        self.events.keys().next_back().copied()
    }

    /// The leftmost event at or after `time_ms`.
    pub fn next_at_or_after(&self, time_ms: i64) -> Option<&MuseEvent> {
        self.range(time_ms..).next()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.len = 0;
    }
}

impl FromIterator<MuseEvent> for OrderedEventStore {
    fn from_iter<I: IntoIterator<Item = MuseEvent>>(iter: I) -> Self {
        let mut store = Self::new();
        for event in iter {
            store.insert(event);
        }
        store
    }
}
