//! Bounded log of accepted positions

use crate::core::{EntryId, HistoryEntry, RefinedPosition};
use std::collections::VecDeque;
use tracing::debug;

/// Append-only history of committed positions, oldest first.
///
/// Entries only leave through capacity eviction or [`HistoryStore::clear`].
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    last_id: Option<u64>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_id: None,
        }
    }

    /// Append a position and return its id.
    ///
    /// Ids derive from the position timestamp but are forced to increase, so
    /// two commits in the same millisecond still get distinct keys.
    pub fn append(&mut self, position: RefinedPosition) -> EntryId {
        let id = match self.last_id {
            Some(last) if position.timestamp_ms <= last => last + 1,
            _ => position.timestamp_ms,
        };
        self.last_id = Some(id);

        let id = EntryId(id);
        self.entries.push_back(HistoryEntry { id, position });
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(id = evicted.id.0, "history entry evicted");
            }
        }
        id
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Full ordered copy for serialization, oldest first
    pub fn export(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    /// Entries most-recent-first, the order tables display them in
    pub fn display_order(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn first(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity; shrinking evicts the oldest entries
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Coordinate;

    fn position(ts: u64, lat: f64) -> RefinedPosition {
        RefinedPosition {
            timestamp_ms: ts,
            coordinate: Coordinate::new(lat, 0.0, 5.0),
        }
    }

    #[test]
    fn test_capacity_two_keeps_last_two() {
        let mut history = HistoryStore::new(2);
        history.append(position(1, 1.0));
        history.append(position(2, 2.0));
        history.append(position(3, 3.0));

        let lats: Vec<f64> = history.export().iter().map(|e| e.position.coordinate.latitude).collect();
        assert_eq!(lats, vec![2.0, 3.0]);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut history = HistoryStore::new(10);
        for ts in 0..50 {
            history.append(position(ts, ts as f64));
            assert!(history.len() <= 10);
        }
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut history = HistoryStore::new(10);
        let a = history.append(position(1000, 1.0));
        let b = history.append(position(1000, 2.0));
        let c = history.append(position(999, 3.0));
        let d = history.append(position(5000, 4.0));
        assert!(a < b && b < c && c < d);
        assert_eq!(d, EntryId(5000));
    }

    #[test]
    fn test_display_order_is_reversed() {
        let mut history = HistoryStore::new(5);
        for ts in 1..=3 {
            history.append(position(ts, ts as f64));
        }
        let order: Vec<u64> = history.display_order().map(|e| e.position.timestamp_ms).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_clear_empties_history() {
        let mut history = HistoryStore::new(5);
        history.append(position(1, 1.0));
        history.clear();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
        // Ids keep increasing after a clear
        let id = history.append(position(1, 1.0));
        assert_eq!(id, EntryId(2));
    }
}
