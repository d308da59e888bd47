//! Shared fixtures: hand-built minimal PDFs and in-memory fakes for the
//! network collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use skyvault::fetch::{DocumentFetcher, FetchFailure};
use skyvault::ocr::{OcrEngine, OcrError, OcrOptions, Recognized};

/// Minimal valid PDF with one page of body text per entry in `pages`.
/// Builds the body first, then an xref table with correct byte offsets.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    // Object ids: 1 catalog, 2 pages, 3..3+n-1 page objects,
    // 3+n..3+2n-1 content streams, 3+2n font.
    let font_id = 3 + 2 * n;
    let mut out = Vec::new();
    let mut offsets = Vec::with_capacity(font_id);

    out.extend_from_slice(b"%PDF-1.4\n");

    offsets.push(out.len());
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

    offsets.push(out.len());
    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 3 + i)).collect();
    out.extend_from_slice(
        format!(
            "2 0 obj << /Type /Pages /Kids [{}] /Count {} >> endobj\n",
            kids.join(" "),
            n
        )
        .as_bytes(),
    );

    for i in 0..n {
        offsets.push(out.len());
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
/Contents {} 0 R /Resources << /Font << /F1 {} 0 R >> >> >> endobj\n",
                3 + i,
                3 + n + i,
                font_id
            )
            .as_bytes(),
        );
    }

    for (i, text) in pages.iter().enumerate() {
        offsets.push(out.len());
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text)
        };
        out.extend_from_slice(
            format!(
                "{} 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
                3 + n + i,
                stream.len(),
                stream
            )
            .as_bytes(),
        );
    }

    offsets.push(out.len());
    out.extend_from_slice(
        format!(
            "{} 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
            font_id
        )
        .as_bytes(),
    );

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", font_id + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            font_id + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

/// Fetcher serving canned responses by URL and counting calls.
pub struct FakeFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchFailure>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), Err(FetchFailure::Status(status)));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(failure)) => Err(failure.clone()),
            None => Err(FetchFailure::Status(404)),
        }
    }
}

/// OCR engine returning one canned outcome and counting calls.
pub struct FakeOcr {
    outcome: Result<Recognized, OcrError>,
    calls: AtomicUsize,
}

impl FakeOcr {
    pub fn recognizing(text: &str) -> Self {
        Self {
            outcome: Ok(Recognized {
                text: text.to_string(),
                elapsed_ms: 12,
                exit_code: Some(1),
                page_count: 1,
                provider_ms: Some(8),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: OcrError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, _url: &str, _options: OcrOptions) -> Result<Recognized, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
