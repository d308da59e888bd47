//! Remote document retrieval.
//!
//! The pipeline never reads files from disk; documents live behind CDN URLs.
//! [`DocumentFetcher`] is the seam that lets the pipeline run against an
//! in-memory fake in tests instead of the network.

use async_trait::async_trait;
use std::time::Duration;

/// Why a fetch did not produce a body.
///
/// A non-2xx response and a transport-level error are surfaced differently to
/// the extractor: the former carries the HTTP status, the latter only a
/// message.
#[derive(Debug, Clone)]
pub enum FetchFailure {
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The request never completed (DNS, TLS, timeout, connection reset).
    Transport(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "fetch returned HTTP {}", code),
            FetchFailure::Transport(msg) => write!(f, "fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchFailure {}

/// Retrieves document bytes from a remote URL.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchFailure>;
}

/// reqwest-backed fetcher with an explicit per-request timeout.
///
/// No retries: a single failed fetch is terminal for the calling extraction.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
