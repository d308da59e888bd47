//! OCR fallback client.
//!
//! Invoked only when a PDF parses cleanly but carries no text layer. The
//! provider is an OCR.space-style HTTP API: a multipart form in, a JSON body
//! out with per-page parsed text. The response is mapped into a typed struct
//! at the boundary instead of being probed as loose JSON.
//!
//! There are no retries; one call per pipeline invocation, and a failure is
//! absorbed by the orchestrator as a conversational answer rather than an
//! error.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::config::OcrConfig;

/// Per-call options forwarded to the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct OcrOptions {
    pub is_table: Option<bool>,
    pub detect_orientation: Option<bool>,
}

/// Successful recognition.
#[derive(Debug, Clone)]
pub struct Recognized {
    /// Per-page fragments joined with `\n`, trimmed. Never empty.
    pub text: String,
    /// Wall-clock time around the provider call.
    pub elapsed_ms: u64,
    /// Provider exit code, when reported.
    pub exit_code: Option<i64>,
    /// Number of parsed result pages the provider returned.
    pub page_count: usize,
    /// Provider-side processing time, when reported.
    pub provider_ms: Option<u64>,
}

/// Typed recognition failure. Elapsed time is attached wherever a network
/// call actually happened.
#[derive(Debug, Clone)]
pub enum OcrError {
    /// No API key configured; the call was skipped before any network I/O.
    MissingApiKey,
    /// Provider answered with a non-2xx status.
    Http { status: u16, elapsed_ms: u64 },
    /// HTTP success, but the provider flagged a processing error.
    Api { message: String, elapsed_ms: u64 },
    /// HTTP success, no provider error, but zero recognizable text.
    NoParsedResults { elapsed_ms: u64 },
    /// The request never completed (network error, timeout, bad body).
    Fetch { message: String, elapsed_ms: u64 },
}

impl OcrError {
    pub fn elapsed_ms(&self) -> Option<u64> {
        match self {
            OcrError::MissingApiKey => None,
            OcrError::Http { elapsed_ms, .. }
            | OcrError::Api { elapsed_ms, .. }
            | OcrError::NoParsedResults { elapsed_ms }
            | OcrError::Fetch { elapsed_ms, .. } => Some(*elapsed_ms),
        }
    }
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::MissingApiKey => write!(f, "skipped (API key missing)"),
            OcrError::Http { status, .. } => write!(f, "provider returned HTTP {}", status),
            OcrError::Api { message, .. } => write!(f, "provider error: {}", message),
            OcrError::NoParsedResults { .. } => write!(f, "no text recognized"),
            OcrError::Fetch { message, .. } => write!(f, "request failed: {}", message),
        }
    }
}

impl std::error::Error for OcrError {}

/// Seam for the pipeline; the HTTP client below is the production
/// implementation, tests substitute fakes.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, url: &str, options: OcrOptions) -> Result<Recognized, OcrError>;
}

// ============ Wire format ============

/// Provider response body. Field names follow the provider's JSON verbatim.
#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(rename = "IsErroredOnProcessing", default)]
    is_errored_on_processing: bool,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<ErrorText>,
    #[serde(rename = "ErrorDetails", default)]
    error_details: Option<String>,
    #[serde(rename = "OCRExitCode", default)]
    exit_code: Option<i64>,
    // The provider serializes this as a string, e.g. "3626".
    #[serde(rename = "ProcessingTimeInMilliseconds", default)]
    processing_time_ms: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
}

/// The provider reports `ErrorMessage` as either one string or an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorText {
    One(String),
    Many(Vec<String>),
}

impl ErrorText {
    fn joined(&self) -> String {
        match self {
            ErrorText::One(s) => s.clone(),
            ErrorText::Many(parts) => parts.join("; "),
        }
    }
}

// ============ HTTP client ============

/// reqwest-backed OCR client.
pub struct OcrClient {
    endpoint: String,
    api_key: Option<String>,
    language: String,
    client: reqwest::Client,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
            language: config.language.clone(),
            client,
        })
    }

    fn build_form(&self, url: &str, options: OcrOptions) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new()
            .text("url", url.to_string())
            .text("language", self.language.clone())
            .text("filetype", "PDF")
            .text("scale", "true")
            .text("OCREngine", "2");
        if let Some(is_table) = options.is_table {
            form = form.text("isTable", if is_table { "true" } else { "false" });
        }
        if let Some(detect) = options.detect_orientation {
            form = form.text("detectOrientation", if detect { "true" } else { "false" });
        }
        form
    }
}

#[async_trait]
impl OcrEngine for OcrClient {
    async fn recognize(&self, url: &str, options: OcrOptions) -> Result<Recognized, OcrError> {
        // The key is never logged and never appears in any answer payload.
        let api_key = self.api_key.as_deref().ok_or(OcrError::MissingApiKey)?;

        let started = Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .header("apikey", api_key)
            .multipart(self.build_form(url, options))
            .send()
            .await
            .map_err(|e| OcrError::Fetch {
                message: e.to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OcrError::Http {
                status: status.as_u16(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
        }

        let body: OcrResponse = resp.json().await.map_err(|e| OcrError::Fetch {
            message: e.to_string(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        interpret_response(body, elapsed_ms)
    }
}

/// Turns a decoded provider response into the typed outcome. Split from the
/// network call so it can be tested against JSON fixtures.
fn interpret_response(body: OcrResponse, elapsed_ms: u64) -> Result<Recognized, OcrError> {
    if body.is_errored_on_processing {
        let message = body
            .error_message
            .as_ref()
            .map(ErrorText::joined)
            .filter(|m| !m.is_empty())
            .or(body.error_details)
            .unwrap_or_else(|| "processing error".to_string());
        return Err(OcrError::Api {
            message,
            elapsed_ms,
        });
    }

    let page_count = body.parsed_results.len();
    let text = body
        .parsed_results
        .iter()
        .map(|p| p.parsed_text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(OcrError::NoParsedResults { elapsed_ms });
    }

    Ok(Recognized {
        text,
        elapsed_ms,
        exit_code: body.exit_code,
        page_count,
        provider_ms: body.processing_time_ms.and_then(|ms| ms.parse().ok()),
    })
}
