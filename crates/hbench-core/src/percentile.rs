use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulator::MergedDataset;

/// Reported for every statistic when no samples were recorded.
pub const NO_DATA: f64 = -1.0;

/// Summary statistics over a merged dataset, latencies in seconds.
///
/// When `count == 0` every other field holds [`NO_DATA`]; check `count`
/// before trusting the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileReport {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// Requested percentile -> latency, ascending by percentile
    pub percentiles: BTreeMap<u8, f64>,
}

impl PercentileReport {
    pub fn has_data(&self) -> bool {
        self.count > 0
    }

    fn empty(percentiles: &[u8]) -> Self {
        Self {
            count: 0,
            min: NO_DATA,
            max: NO_DATA,
            average: NO_DATA,
            percentiles: percentiles.iter().map(|&p| (p, NO_DATA)).collect(),
        }
    }
}

/// Nearest-rank percentile over an ascending slice.
///
/// Index is `floor(p * count / 100)`, zero-based, no interpolation; `p >= 100`
/// yields the maximum.
pub fn percentile(sorted: &[f64], p: u8) -> f64 {
    let count = sorted.len();
    match count {
        0 => NO_DATA,
        1 => sorted[0],
        _ if p >= 100 => sorted[count - 1],
        _ => sorted[(p as usize * count) / 100],
    }
}

/// Sort the dataset's samples in place and summarise them.
///
/// The average uses the dataset's running total rather than re-summing the
/// sorted samples.
pub fn compute_percentiles(dataset: &mut MergedDataset, percentiles: &[u8]) -> PercentileReport {
    dataset.samples.sort_unstable_by(f64::total_cmp);

    let sorted = &dataset.samples;
    let count = sorted.len();
    if count == 0 {
        return PercentileReport::empty(percentiles);
    }

    PercentileReport {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        average: dataset.total / count as f64,
        percentiles: percentiles
            .iter()
            .map(|&p| (p, percentile(sorted, p)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PERCENTILES;

    fn dataset(samples: &[f64]) -> MergedDataset {
        MergedDataset {
            samples: samples.to_vec(),
            counts: BTreeMap::new(),
            total: samples.iter().sum(),
        }
    }

    #[test]
    fn test_empty_dataset_reports_sentinel() {
        let report = compute_percentiles(&mut dataset(&[]), &DEFAULT_PERCENTILES);

        assert_eq!(report.count, 0);
        assert!(!report.has_data());
        assert_eq!(report.min, NO_DATA);
        assert_eq!(report.max, NO_DATA);
        assert_eq!(report.average, NO_DATA);
        assert_eq!(report.percentiles.len(), DEFAULT_PERCENTILES.len());
        assert!(report.percentiles.values().all(|&v| v == NO_DATA));
    }

    #[test]
    fn test_singleton_dataset() {
        let report = compute_percentiles(&mut dataset(&[0.25]), &[0, 10, 50, 99, 100]);

        assert_eq!(report.count, 1);
        assert_eq!(report.min, 0.25);
        assert_eq!(report.max, 0.25);
        assert_eq!(report.average, 0.25);
        assert!(report.percentiles.values().all(|&v| v == 0.25));
    }

    #[test]
    fn test_nearest_rank_indexing() {
        // 1..=10 shuffled
        let mut data = dataset(&[7.0, 3.0, 10.0, 1.0, 5.0, 9.0, 2.0, 8.0, 4.0, 6.0]);
        let report = compute_percentiles(&mut data, &[0, 10, 50, 90, 99, 100]);

        assert_eq!(report.count, 10);
        assert_eq!(report.min, 1.0);
        assert_eq!(report.max, 10.0);
        assert!((report.average - 5.5).abs() < 1e-12);
        // floor(p * 10 / 100)
        assert_eq!(report.percentiles[&0], 1.0);
        assert_eq!(report.percentiles[&10], 2.0);
        assert_eq!(report.percentiles[&50], 6.0);
        assert_eq!(report.percentiles[&90], 10.0);
        assert_eq!(report.percentiles[&99], 10.0);
        assert_eq!(report.percentiles[&100], 10.0);
    }

    #[test]
    fn test_truncating_division_picks_lower_index() {
        let sorted = [1.0, 2.0, 3.0];
        // 50 * 3 / 100 = 1.5 -> 1
        assert_eq!(percentile(&sorted, 50), 2.0);
        // 33 * 3 / 100 = 0.99 -> 0
        assert_eq!(percentile(&sorted, 33), 1.0);
        assert_eq!(percentile(&sorted, 100), 3.0);
        assert_eq!(percentile(&[], 50), NO_DATA);
    }

    #[test]
    fn test_percentiles_are_monotonic() {
        let samples: Vec<f64> = (0..257).map(|i| ((i * 7919) % 257) as f64 / 10.0).collect();
        let all: Vec<u8> = (0..=100).collect();
        let report = compute_percentiles(&mut dataset(&samples), &all);

        let values: Vec<f64> = report.percentiles.values().copied().collect();
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1], "{:?}", pair);
        }
        assert_eq!(report.percentiles[&100], report.max);
    }

    #[test]
    fn test_average_uses_running_total() {
        let mut data = dataset(&[1.0, 2.0, 3.0]);
        data.total = 9.0;
        let report = compute_percentiles(&mut data, &[50]);
        assert_eq!(report.average, 3.0);
    }
}
