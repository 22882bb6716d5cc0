use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::accumulator::{Accumulator, MergedDataset};
use crate::config::BenchConfig;
use crate::fetcher::Fetcher;
use crate::percentile::{compute_percentiles, PercentileReport};
use crate::queue::{work_queue, WorkReceiver};
use crate::status::StatusClass;
use crate::targets::TargetSupply;

/// Everything a run produces, handed to the reporter.
#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub requests: u64,
    pub concurrency: usize,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub requests_per_sec: f64,
    pub report: PercentileReport,
    pub status_counts: BTreeMap<StatusClass, u64>,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

/// Pull URLs until the queue is closed and drained, timing each fetch.
///
/// Latency spans the whole fetch, connection setup through the last body byte.
pub async fn worker_loop(id: usize, rx: WorkReceiver, fetcher: Arc<dyn Fetcher>) -> Accumulator {
    let mut acc = Accumulator::new();
    while let Ok(url) = rx.recv_async().await {
        let start = Instant::now();
        let outcome = fetcher.fetch(&url).await;
        let elapsed = start.elapsed();
        acc.record(elapsed, outcome.class);
    }
    debug!("worker {} done after {} requests", id, acc.len());
    acc
}

/// Drive `config.requests` GETs through `config.concurrency` workers and merge
/// the results.
///
/// The merge runs only after every worker task has been joined.
pub async fn run_workers(
    config: &BenchConfig,
    supply: TargetSupply,
    fetcher: Arc<dyn Fetcher>,
) -> Result<MergedDataset> {
    let (tx, rx) = work_queue(config.queue_capacity());

    let mut handles = Vec::with_capacity(config.concurrency);
    for id in 0..config.concurrency {
        let rx = rx.clone();
        let fetcher = fetcher.clone();
        handles.push(tokio::spawn(worker_loop(id, rx, fetcher)));
    }
    drop(rx);

    let producer = tokio::spawn(supply.feed(config.requests, tx));

    let mut accumulators = Vec::with_capacity(handles.len());
    for (id, handle) in handles.into_iter().enumerate() {
        let acc = handle
            .await
            .with_context(|| format!("worker {} did not complete", id))?;
        accumulators.push(acc);
    }
    let queued = producer.await.context("target supply did not complete")?;

    let merged = MergedDataset::merge(accumulators);
    info!(
        "All {} workers finished: {} queued, {} completed",
        config.concurrency,
        queued,
        merged.len()
    );
    Ok(merged)
}

/// Run a full benchmark: workers, merge, then percentiles.
pub async fn run(
    config: &BenchConfig,
    supply: TargetSupply,
    fetcher: Arc<dyn Fetcher>,
) -> Result<BenchResult> {
    info!(
        "Starting {} requests with {} workers against {} ({} fetcher)",
        config.requests,
        config.concurrency,
        supply.describe(),
        fetcher.name()
    );

    let start = Instant::now();
    let mut merged = run_workers(config, supply, fetcher).await?;
    let elapsed = start.elapsed();

    let report = compute_percentiles(&mut merged, &config.percentiles);
    let elapsed_secs = elapsed.as_secs_f64();
    let requests_per_sec = if elapsed_secs > 0.0 {
        report.count as f64 / elapsed_secs
    } else {
        0.0
    };

    Ok(BenchResult {
        requests: config.requests,
        concurrency: config.concurrency,
        elapsed,
        requests_per_sec,
        report,
        status_counts: merged.counts,
    })
}
