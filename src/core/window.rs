//! Sample windowing for the smoothing and display pipeline.
//!
//! Two bounded buffers live here: the short smoothing window the classifier
//! reads, and the longer history kept only so the host can draw a chart.

use crate::core::engine::Sample;
use std::collections::VecDeque;

/// Capacity of the display history buffer.
pub const HISTORY_CAPACITY: usize = 400;

/// A bounded, ordered window over the most recent samples.
///
/// Pushing beyond capacity evicts the oldest sample. Capacity can change
/// between pushes; shrinking evicts oldest samples immediately.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleWindow {
    /// Create a window with the given capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Change the capacity, evicting oldest samples if the window shrank.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Append a sample, evicting the oldest if the window is full.
    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Truncated arithmetic mean of the window contents.
    ///
    /// Returns `None` when the window is empty.
    pub fn smoothed(&self) -> Option<Sample> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u32 = self.samples.iter().map(|&s| u32::from(s)).sum();
        Some((sum / self.samples.len() as u32) as Sample)
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
}

/// Display history of recent samples, capped at [`HISTORY_CAPACITY`].
///
/// The classifier never reads this; it exists so the host can render the
/// run. Eviction is oldest-first.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    values: VecDeque<Sample>,
    capacity: usize,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a history with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(sample);
    }

    /// The retained samples, oldest first.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.values.iter().copied().collect()
    }

    /// The most recently pushed sample.
    pub fn latest(&self) -> Option<Sample> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new()
    }
}
