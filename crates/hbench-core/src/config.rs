use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_REQUESTS: u64 = 100;
pub const DEFAULT_CONCURRENCY: usize = 2;
pub const DEFAULT_QUEUE_DEPTH_PER_WORKER: usize = 10;
pub const DEFAULT_PERCENTILES: [u8; 5] = [10, 50, 90, 99, 100];

/// Immutable description of one benchmark run.
///
/// Built once at startup (from a TOML file, CLI flags, or both) and handed by
/// reference to the target supply and the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Total number of GET requests to issue
    #[serde(default = "default_requests")]
    pub requests: u64,
    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub target: TargetConfig,
    /// Percentiles (0-100) to report
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<u8>,
    /// Work queue slots per worker
    #[serde(default = "default_queue_depth")]
    pub queue_depth_per_worker: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Single URL requested on every iteration
    pub url: Option<String>,
    /// File with one URL per line, requested round-robin
    pub url_file: Option<PathBuf>,
}

fn default_requests() -> u64 {
    DEFAULT_REQUESTS
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_percentiles() -> Vec<u8> {
    DEFAULT_PERCENTILES.to_vec()
}

fn default_queue_depth() -> usize {
    DEFAULT_QUEUE_DEPTH_PER_WORKER
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            requests: DEFAULT_REQUESTS,
            concurrency: DEFAULT_CONCURRENCY,
            target: TargetConfig::default(),
            percentiles: default_percentiles(),
            queue_depth_per_worker: DEFAULT_QUEUE_DEPTH_PER_WORKER,
        }
    }
}

impl BenchConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BenchConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Check numeric bounds and normalise the percentile list (sorted, unique).
    pub fn validate(mut self) -> anyhow::Result<Self> {
        if self.requests == 0 {
            anyhow::bail!("requests must be a positive integer");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be a positive integer");
        }
        if self.queue_depth_per_worker == 0 {
            anyhow::bail!("queue_depth_per_worker must be a positive integer");
        }
        if let Some(p) = self.percentiles.iter().find(|&&p| p > 100) {
            anyhow::bail!("percentile {} is out of range 0-100", p);
        }
        self.percentiles.sort_unstable();
        self.percentiles.dedup();
        Ok(self)
    }

    /// Capacity of the bounded work queue.
    pub fn queue_capacity(&self) -> usize {
        self.concurrency.saturating_mul(self.queue_depth_per_worker)
    }
}
