use anyhow::{Context, Result};
use clap::Parser;
use hbench_core::{BenchConfig, BenchResult, Fetcher, HttpFetcher, MockFetcher, TargetSupply};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hbench")]
#[command(about = "HTTP GET load generator - reports latency percentiles per run")]
struct Args {
    /// Optional TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Total request count
    #[arg(long)]
    reqs: Option<u64>,

    /// URL target
    #[arg(long)]
    url: Option<String>,

    /// File with 1 url per line
    #[arg(long = "urlfile")]
    url_file: Option<PathBuf>,

    /// Number of concurrent requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Comma separated percentiles to report, e.g. 50,90,99
    #[arg(long, value_delimiter = ',')]
    percentiles: Option<Vec<u8>>,

    /// Fetch mode: http or mock
    #[arg(long, default_value = "http")]
    mode: String,

    /// Write the result as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunRecord<'a> {
    timestamp: String,
    mode: &'a str,
    #[serde(flatten)]
    result: &'a BenchResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let supply = TargetSupply::from_config(&config).context("No usable request target")?;

    let fetcher: Arc<dyn Fetcher> = match args.mode.as_str() {
        "http" => Arc::new(HttpFetcher::new().context("Failed to create HTTP client")?),
        "mock" => Arc::new(MockFetcher::new(5)),
        _ => anyhow::bail!("Invalid mode: {}, must be 'http' or 'mock'", args.mode),
    };

    let result = hbench_core::run(&config, supply, fetcher).await?;

    if let Some(path) = &args.output {
        let record = RunRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode: &args.mode,
            result: &result,
        };
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write results to {:?}", path))?;
        info!("Results written to {:?}", path);
    }

    print_summary(&result);
    Ok(())
}

fn build_config(args: &Args) -> Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => BenchConfig::default(),
    };

    if let Some(reqs) = args.reqs {
        config.requests = reqs;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(percentiles) = &args.percentiles {
        config.percentiles = percentiles.clone();
    }
    // A target given on the command line replaces the file's target mode.
    if args.url.is_some() || args.url_file.is_some() {
        config.target.url = args.url.clone();
        config.target.url_file = args.url_file.clone();
    }

    config.validate()
}

fn print_summary(result: &BenchResult) {
    let report = &result.report;
    println!();
    println!(
        "count: {},    min: {:.3},    avg: {:.3},    max: {:.3}",
        report.count, report.min, report.average, report.max
    );
    let line: Vec<String> = report
        .percentiles
        .iter()
        .map(|(p, v)| format!("P{}%: {:.3}", p, v))
        .collect();
    println!("{}", line.join(",    "));

    println!();
    println!("Status breakdown:");
    for (class, count) in &result.status_counts {
        println!("  {}: {}", class, count);
    }
    println!(
        "Elapsed: {:.3}s, {:.1} req/s",
        result.elapsed.as_secs_f64(),
        result.requests_per_sec
    );
    println!();
}
