//! Bounded window of raw samples shared by all sources

use crate::core::{Sample, SourceTag};
use std::collections::VecDeque;
use tracing::trace;

/// FIFO of recent samples.
///
/// All sources count toward the same capacity, so enabling extra watchers
/// shortens the window each individual source gets.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create a buffer holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones past capacity
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        self.evict_overflow();
        trace!(
            source = %sample.source,
            len = self.samples.len(),
            "sample buffered"
        );
    }

    /// Change the capacity; shrinking evicts oldest samples
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.evict_overflow();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples oldest-first
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Number of buffered samples from a given source
    pub fn count_from(&self, source: SourceTag) -> usize {
        self.samples.iter().filter(|s| s.source == source).count()
    }

    fn evict_overflow(&mut self) {
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }
}

impl<'a> IntoIterator for &'a SampleBuffer {
    type Item = &'a Sample;
    type IntoIter = std::collections::vec_deque::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
