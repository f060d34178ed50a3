//! Counter Aggregation Module
//!
//! Tracks hit, miss and object counts in memory and decides when they are
//! due to be flushed to the backend.

use serde::Serialize;

// == Counter Keys ==
/// Backend keys the counters are persisted under. A blank key disables
/// persistence of that counter.
#[derive(Debug, Clone, Default)]
pub struct CounterKeys {
    pub hit_key: String,
    pub miss_key: String,
    pub object_count_key: String,
}

// == Counter Snapshot ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Finds that returned a payload
    pub hits: u64,
    /// Finds that returned nothing
    pub misses: u64,
    /// Live entries written through this facade
    pub objects: u64,
}

impl CounterSnapshot {
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counter Aggregator ==
/// In-memory counters with a flush cadence of `threshold` lookups.
#[derive(Debug, Clone)]
pub struct CounterAggregator {
    hits: u64,
    misses: u64,
    objects: u64,
    /// Lookups since the last flush
    action_count: u64,
    threshold: u64,
}

impl CounterAggregator {
    // == Constructor ==
    /// Creates an aggregator with all counters at zero.
    pub fn new(threshold: u64) -> Self {
        Self {
            hits: 0,
            misses: 0,
            objects: 0,
            action_count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Changes the flush cadence; non-positive values are ignored.
    pub fn set_threshold(&mut self, threshold: u64) {
        if threshold > 0 {
            self.threshold = threshold;
        }
    }

    // == Record Lookup ==
    /// Records a hit or miss. Returns true when the lookup completes a
    /// flush window; the window counter is then back at zero.
    pub fn record_lookup(&mut self, hit: bool) -> bool {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }

        self.action_count += 1;
        if self.action_count >= self.threshold {
            self.action_count = 0;
            true
        } else {
            false
        }
    }

    /// One more entry created.
    pub fn record_created(&mut self) {
        self.objects += 1;
    }

    /// `count` entries removed; never drops below zero.
    pub fn record_removed(&mut self, count: u64) {
        self.objects = self.objects.saturating_sub(count);
    }

    /// Overrides the object count, e.g. from persisted state or a namespace clear.
    pub fn set_objects(&mut self, count: u64) {
        self.objects = count;
    }

    /// Lookups since the last flush.
    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            hits: self.hits,
            misses: self.misses,
            objects: self.objects,
        }
    }
}
