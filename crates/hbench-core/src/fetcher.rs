use anyhow::Result;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::status::RequestOutcome;

/// Trait for the HTTP GET adapters driven by the worker pool.
///
/// A fetch never fails: transport and body errors are folded into the
/// returned outcome so the caller can count them.
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = RequestOutcome> + Send + 'a>>;
}

/// Mock fetcher for testing (fixed outcome after a configurable delay)
///
/// Shares no state between workers unless built with [`MockFetcher::recording`].
pub struct MockFetcher {
    delay_ms: u64,
    outcome: RequestOutcome,
    requested: Option<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(delay_ms: u64) -> Self {
        Self::with_outcome(delay_ms, RequestOutcome::success(200, 0))
    }

    pub fn with_outcome(delay_ms: u64, outcome: RequestOutcome) -> Self {
        Self {
            delay_ms,
            outcome,
            requested: None,
        }
    }

    /// Keep every fetched URL so tests can inspect the request sequence.
    pub fn recording(mut self) -> Self {
        self.requested = Some(Mutex::new(Vec::new()));
        self
    }

    /// URLs fetched so far, in completion order; empty unless recording.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .as_ref()
            .and_then(|urls| urls.lock().ok().map(|urls| urls.clone()))
            .unwrap_or_default()
    }
}

impl Fetcher for MockFetcher {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = RequestOutcome> + Send + 'a>> {
        Box::pin(async move {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if let Some(Ok(mut urls)) = self.requested.as_ref().map(|m| m.lock()) {
                urls.push(url.to_string());
            }
            self.outcome
        })
    }
}

/// Plain HTTP(S) GET through a shared reqwest client.
///
/// No request timeout is configured; a hung server holds its worker until the
/// transport gives up.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = RequestOutcome> + Send + 'a>> {
        Box::pin(async move {
            let response = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!("http get failed, url: {}, error: {}", url, e);
                    return RequestOutcome::transport_failure();
                }
            };

            let status = response.status().as_u16();
            // `bytes` consumes the response, releasing the connection on every path.
            match response.bytes().await {
                Ok(body) => RequestOutcome::success(status, body.len()),
                Err(e) => {
                    debug!("reading body failed, url: {}, status: {}, error: {}", url, status, e);
                    RequestOutcome::body_read_failure(status)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusClass;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `raw` verbatim to a single connection and close it.
    async fn serve_once(raw: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(raw).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}/", addr)
    }

    fn local_fetcher() -> HttpFetcher {
        HttpFetcher::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn test_mock_fetcher_records_urls() {
        let fetcher = MockFetcher::new(0).recording();
        let outcome = fetcher.fetch("http://a/").await;
        assert_eq!(outcome.class, StatusClass::Http(200));
        assert_eq!(fetcher.requested(), vec!["http://a/"]);
    }

    #[tokio::test]
    async fn test_mock_fetcher_does_not_record_by_default() {
        let fetcher = MockFetcher::new(0);
        for _ in 0..3 {
            fetcher.fetch("http://a/").await;
        }
        assert!(fetcher.requested.is_none());
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_http_success() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let fetcher = local_fetcher();
        let outcome = fetcher.fetch(&url).await;
        assert_eq!(outcome, RequestOutcome::success(200, 5));
    }

    #[tokio::test]
    async fn test_http_error_status_is_not_a_failure() {
        let url = serve_once(
            b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let fetcher = local_fetcher();
        let outcome = fetcher.fetch(&url).await;
        assert_eq!(outcome.class, StatusClass::Http(503));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = local_fetcher();
        let outcome = fetcher.fetch(&format!("http://{}/", addr)).await;
        assert_eq!(outcome, RequestOutcome::transport_failure());
    }

    #[tokio::test]
    async fn test_truncated_body_is_body_read_failure() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
        )
        .await;

        let fetcher = local_fetcher();
        let outcome = fetcher.fetch(&url).await;
        assert_eq!(outcome, RequestOutcome::body_read_failure(200));
    }
}
