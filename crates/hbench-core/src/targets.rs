use anyhow::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::config::BenchConfig;
use crate::queue::WorkSender;

/// Source of the URLs fed to the work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSupply {
    /// The same URL for every request
    Single(String),
    /// URLs taken round-robin; never empty
    List(Vec<String>),
}

impl TargetSupply {
    /// Resolve the target mode from the configuration.
    ///
    /// Exactly one of `target.url` and `target.url_file` must be set, and the
    /// selected mode must yield at least one usable URL.
    pub fn from_config(config: &BenchConfig) -> Result<Self> {
        match (&config.target.url, &config.target.url_file) {
            (Some(_), Some(_)) => {
                anyhow::bail!("bad args: use either 'url' or 'url_file', not both")
            }
            (None, None) => anyhow::bail!("bad args: either 'url' or 'url_file' should be used"),
            (Some(url), None) => Self::single(url),
            (None, Some(path)) => Self::list(load_url_file(path)),
        }
    }

    pub fn single(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            anyhow::bail!("target url is empty");
        }
        Ok(TargetSupply::Single(url.to_string()))
    }

    pub fn list(urls: Vec<String>) -> Result<Self> {
        if urls.is_empty() {
            anyhow::bail!("url list is empty, nothing to request");
        }
        Ok(TargetSupply::List(urls))
    }

    /// URL for request `i` (zero-based).
    pub fn url_at(&self, i: u64) -> &str {
        match self {
            TargetSupply::Single(url) => url,
            TargetSupply::List(urls) => &urls[(i % urls.len() as u64) as usize],
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TargetSupply::Single(url) => format!("single url {}", url),
            TargetSupply::List(urls) => format!("{} urls round-robin", urls.len()),
        }
    }

    /// Push exactly `total` work items, then close the queue by dropping the sender.
    ///
    /// Suspends whenever the queue is full. Returns the number of items
    /// delivered, which is short of `total` only if every worker has gone away.
    pub async fn feed(self, total: u64, tx: WorkSender) -> u64 {
        let mut sent = 0u64;
        for i in 0..total {
            let url = self.url_at(i).to_string();
            if tx.send_async(url).await.is_err() {
                warn!("All workers exited early; stopped after {} of {} requests", sent, total);
                break;
            }
            sent += 1;
        }
        drop(tx);
        info!("Queued {} requests, work queue closed", sent);
        sent
    }
}

/// Read a newline-delimited URL file.
///
/// Every trimmed non-empty line is kept as written, even if it is not a
/// well-formed URL; such targets are counted as transport failures at request
/// time. Lines that are not valid UTF-8 are logged and skipped. A failure to
/// open or read the file is logged and ends the list early; the caller
/// decides whether what remains is usable.
pub fn load_url_file(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("error opening url file: {}, err: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut urls = Vec::new();
    for (lineno, line) in BufReader::new(file).split(b'\n').enumerate() {
        let bytes = match line {
            Ok(b) => b,
            Err(e) => {
                warn!("error reading url file: {}, err: {}", path.display(), e);
                break;
            }
        };
        let line = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                warn!("{}:{}: skipping non utf-8 line", path.display(), lineno + 1);
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        urls.push(line.to_string());
    }
    urls
}
