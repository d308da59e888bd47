//! Document text extraction.
//!
//! Given a document reference (remote URL + declared MIME type), produces the
//! document's plain text or a typed failure. Three families are supported:
//! `text/*` passthrough, PDF text-layer extraction (page-bounded), and Word
//! documents via the OOXML `word/document.xml` text runs.
//!
//! A structurally valid PDF whose text layer is empty is reported as
//! [`Extraction::EmptyTextLayer`], the signal that the file is likely a
//! scanned image and an OCR fallback is worth attempting. Only PDFs ever
//! produce the sentinel; an empty Word document is ordinary empty text.

use std::io::Read;

use crate::config::ExtractionConfig;
use crate::fetch::{DocumentFetcher, FetchFailure};
use crate::models::DocumentRef;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Decompressed-size bound for a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Successful extraction outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Plain text, already truncated to the configured character bound.
    Text(String),
    /// The PDF parsed fine but holds zero extractable characters.
    EmptyTextLayer,
}

/// Typed extraction failure. Never retried; the orchestrator turns these into
/// conversational explanations rather than propagating them.
#[derive(Debug, Clone)]
pub enum ExtractError {
    /// MIME type outside the supported set. Raised before any network fetch.
    UnsupportedType(String),
    /// Non-2xx response while fetching the document bytes.
    Fetch(u16),
    PdfParse(String),
    DocParse(String),
    /// Transport-level fetch failure or anything else unexpected.
    Unknown(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::UnsupportedType(mt) => write!(f, "unsupported media type: {}", mt),
            ExtractError::Fetch(status) => write!(f, "document fetch returned HTTP {}", status),
            ExtractError::PdfParse(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::DocParse(e) => write!(f, "Word document extraction failed: {}", e),
            ExtractError::Unknown(e) => write!(f, "extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<FetchFailure> for ExtractError {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Status(code) => ExtractError::Fetch(code),
            FetchFailure::Transport(msg) => ExtractError::Unknown(msg),
        }
    }
}

/// Extracts plain text for `doc`, dispatching on the declared media type.
///
/// Unsupported types are rejected without touching the network. All returned
/// text is truncated to `limits.max_text_chars` characters.
pub async fn extract(
    fetcher: &dyn DocumentFetcher,
    doc: &DocumentRef,
    limits: &ExtractionConfig,
) -> Result<Extraction, ExtractError> {
    let media_type = doc.media_type.as_str();

    if media_type.starts_with("text/") {
        let bytes = fetcher.fetch_bytes(&doc.remote_url).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        return Ok(Extraction::Text(truncate_chars(text, limits.max_text_chars)));
    }

    match media_type {
        MIME_PDF => {
            let bytes = fetcher.fetch_bytes(&doc.remote_url).await?;
            let text = extract_pdf_text(&bytes, limits.max_pdf_pages)?;
            if text.trim().is_empty() {
                Ok(Extraction::EmptyTextLayer)
            } else {
                Ok(Extraction::Text(truncate_chars(text, limits.max_text_chars)))
            }
        }
        MIME_DOC | MIME_DOCX => {
            let bytes = fetcher.fetch_bytes(&doc.remote_url).await?;
            // Empty string is valid Word content, not the scanned-PDF signal.
            let text = extract_docx_text(&bytes)?;
            Ok(Extraction::Text(truncate_chars(text, limits.max_text_chars)))
        }
        other => Err(ExtractError::UnsupportedType(other.to_string())),
    }
}

/// Extracts the text layer of the first `max_pages` pages, joined by `\n`.
/// Later pages are silently ignored to bound latency and memory.
pub fn extract_pdf_text(bytes: &[u8], max_pages: usize) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::PdfParse(e.to_string()))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys().take(max_pages) {
        let page_text = doc
            .extract_text(&[*page_number])
            .map_err(|e| ExtractError::PdfParse(e.to_string()))?;
        pages.push(page_text);
    }
    Ok(pages.join("\n"))
}

/// Extracts a Word document's text: unzip, find `word/document.xml`, collect
/// the `<w:t>` text runs. Legacy binary `.doc` bytes fail the ZIP open and
/// surface as `DocParse`.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::DocParse(e.to_string()))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::DocParse(format!("word/document.xml: {}", e)))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::DocParse(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::DocParse(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    collect_text_runs(&xml)
}

/// Walks the document XML and concatenates the contents of `<w:t>` elements.
/// Text inside a run is taken verbatim; a run's leading/trailing spaces are
/// significant, since Word splits sentences across runs mid-word-boundary.
fn collect_text_runs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::Text(t)) if in_text_run => {
                out.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::DocParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Truncate to at most `max` characters without splitting a UTF-8 scalar.
pub fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
    s
}
