use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::status::StatusClass;

/// Per-worker record of latencies and status counts.
///
/// Owned by exactly one worker task, so it is updated without locking.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    samples: Vec<f64>,
    counts: BTreeMap<StatusClass, u64>,
    total: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed request, successful or not.
    pub fn record(&mut self, latency: Duration, class: StatusClass) {
        let secs = latency.as_secs_f64();
        self.samples.push(secs);
        *self.counts.entry(class).or_insert(0) += 1;
        self.total += secs;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Latency samples in seconds, in recording order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn counts(&self) -> &BTreeMap<StatusClass, u64> {
        &self.counts
    }

    /// Running sum of all recorded latencies, in seconds.
    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Union of every worker's accumulator, built after the pool has drained.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergedDataset {
    pub samples: Vec<f64>,
    pub counts: BTreeMap<StatusClass, u64>,
    pub total: f64,
}

impl MergedDataset {
    /// Concatenate samples, sum totals and sum per-class counts.
    pub fn merge<I>(accumulators: I) -> Self
    where
        I: IntoIterator<Item = Accumulator>,
    {
        let mut merged = MergedDataset::default();
        for acc in accumulators {
            merged.samples.extend_from_slice(&acc.samples);
            merged.total += acc.total;
            for (class, count) in acc.counts {
                *merged.counts.entry(class).or_insert(0) += count;
            }
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum of all status counts; equals `len()` for any merge of accumulators.
    pub fn counted(&self) -> u64 {
        self.counts.values().sum()
    }
}
