//! Pipeline orchestrator.
//!
//! Sequences extraction, the at-most-once OCR fallback, and answer synthesis
//! for a single document question. Extraction and OCR failures are absorbed:
//! every terminal state produces a normal response whose `answer_text`
//! explains what happened in plain language. Technical detail (HTTP statuses,
//! provider errors, exception text) only ever appears in the flag-gated debug
//! payload.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::answer::{answer_from_sentences, split_sentences};
use crate::config::{AnswerConfig, Config, ExtractionConfig};
use crate::extract::{extract, truncate_chars, ExtractError, Extraction, MIME_PDF};
use crate::fetch::{DocumentFetcher, HttpFetcher};
use crate::models::{latest_user_question, DocumentRef, Message};
use crate::ocr::{OcrClient, OcrEngine, OcrError, OcrOptions};

const TEXT_PREVIEW_CHARS: usize = 200;
const SENTENCE_PREVIEW_COUNT: usize = 3;

/// Final pipeline output, serialized verbatim by the HTTP layer.
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub answer_text: String,
    /// 0 to 5 supporting sentences, best match first.
    pub snippets: Vec<String>,
    pub metadata: AnswerMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugReport>,
}

#[derive(Debug, Serialize)]
pub struct AnswerMetadata {
    pub document_name: String,
    pub media_type: String,
    pub sentence_count: usize,
    pub snippet_count: usize,
}

/// Observational telemetry, returned only when the caller sets the debug
/// flag. Never behavior-altering.
#[derive(Debug, Serialize)]
pub struct DebugReport {
    pub media_type: String,
    pub extraction_elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
    pub text_length: usize,
    pub text_preview: String,
    pub sentence_preview: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrDebug>,
}

#[derive(Debug, Serialize)]
pub struct OcrDebug {
    pub attempted: bool,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

/// The extraction → OCR → synthesis pipeline with its injected collaborators.
/// Stateless per request; one instance serves any number of concurrent calls.
pub struct AnswerPipeline {
    fetcher: Arc<dyn DocumentFetcher>,
    ocr: Arc<dyn OcrEngine>,
    extraction: ExtractionConfig,
    answer: AnswerConfig,
}

impl AnswerPipeline {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        ocr: Arc<dyn OcrEngine>,
        extraction: ExtractionConfig,
        answer: AnswerConfig,
    ) -> Self {
        Self {
            fetcher,
            ocr,
            extraction,
            answer,
        }
    }

    /// Builds the production pipeline (HTTP fetcher + OCR client) from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(std::time::Duration::from_secs(config.fetch.timeout_secs))?;
        let ocr = OcrClient::new(&config.ocr)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(ocr),
            config.extraction.clone(),
            config.answer.clone(),
        ))
    }

    /// Answers the latest user question in `conversation` about `doc`.
    ///
    /// Returns `Err` only for the caller-contract violation of a conversation
    /// with no user message; every extraction/OCR failure is a normal
    /// response with a conversational `answer_text`.
    pub async fn answer_about_document(
        &self,
        doc: &DocumentRef,
        conversation: &[Message],
        debug: bool,
    ) -> Result<PipelineResponse> {
        let question = latest_user_question(conversation)
            .ok_or_else(|| anyhow::anyhow!("conversation contains no user message"))?;

        let started = Instant::now();
        let extraction = extract(self.fetcher.as_ref(), doc, &self.extraction).await;
        let extraction_elapsed_ms = started.elapsed().as_millis() as u64;

        let (text, ocr_debug) = match extraction {
            Err(err) => {
                return Ok(self.extraction_failed(doc, &err, extraction_elapsed_ms, debug));
            }
            Ok(Extraction::EmptyTextLayer) if doc.media_type == MIME_PDF => {
                match self
                    .ocr
                    .recognize(&doc.remote_url, OcrOptions::default())
                    .await
                {
                    Ok(recognized) => {
                        let elapsed_ms = recognized.elapsed_ms;
                        // OCR output is capped exactly like extracted text.
                        let capped =
                            truncate_chars(recognized.text, self.extraction.max_text_chars);
                        let ocr_debug = OcrDebug {
                            attempted: true,
                            succeeded: true,
                            error: None,
                            elapsed_ms: Some(elapsed_ms),
                        };
                        (capped, Some(ocr_debug))
                    }
                    Err(err) => {
                        return Ok(self.no_selectable_text(
                            doc,
                            Some(&err),
                            extraction_elapsed_ms,
                            debug,
                        ));
                    }
                }
            }
            Ok(Extraction::EmptyTextLayer) => {
                // The extractor only emits the sentinel for PDFs; if it ever
                // shows up for another type, answer as if OCR were unavailable.
                return Ok(self.no_selectable_text(doc, None, extraction_elapsed_ms, debug));
            }
            Ok(Extraction::Text(text)) => (text, None),
        };

        let sentences = split_sentences(&text);
        let result = answer_from_sentences(question, &sentences, &self.answer);

        let debug_report = debug.then(|| DebugReport {
            media_type: doc.media_type.clone(),
            extraction_elapsed_ms,
            extraction_error: None,
            text_length: text.chars().count(),
            text_preview: preview(&text),
            sentence_preview: sentences
                .iter()
                .take(SENTENCE_PREVIEW_COUNT)
                .cloned()
                .collect(),
            ocr: ocr_debug,
        });

        Ok(PipelineResponse {
            metadata: AnswerMetadata {
                document_name: doc.display_name.clone(),
                media_type: doc.media_type.clone(),
                sentence_count: sentences.len(),
                snippet_count: result.snippets.len(),
            },
            answer_text: result.answer_text,
            snippets: result.snippets,
            debug: debug_report,
        })
    }

    /// Terminal: the extractor returned a typed failure.
    fn extraction_failed(
        &self,
        doc: &DocumentRef,
        err: &ExtractError,
        extraction_elapsed_ms: u64,
        debug: bool,
    ) -> PipelineResponse {
        let answer_text = format!(
            "I was not able to read this file (declared type: {}). Either this \
file type is not supported for text extraction, or the extraction itself \
failed. Supported types are plain text, PDF, and Word documents.",
            doc.media_type
        );
        self.terminal(doc, answer_text, extraction_elapsed_ms, debug, |report| {
            report.extraction_error = Some(err.to_string());
        })
    }

    /// Terminal: PDF with no text layer, and OCR failed, was skipped, or was
    /// never applicable.
    fn no_selectable_text(
        &self,
        doc: &DocumentRef,
        ocr_err: Option<&OcrError>,
        extraction_elapsed_ms: u64,
        debug: bool,
    ) -> PipelineResponse {
        let ocr_clause = match ocr_err {
            None => "Text recognition was not attempted.".to_string(),
            Some(OcrError::MissingApiKey) => {
                "Text recognition was skipped (API key missing).".to_string()
            }
            Some(err) => format!("Text recognition was attempted but failed ({}).", err),
        };
        let answer_text = format!(
            "This document contains no selectable text, so it is probably a \
scanned image. {}",
            ocr_clause
        );
        let ocr_debug = OcrDebug {
            attempted: matches!(
                ocr_err,
                Some(e) if !matches!(e, OcrError::MissingApiKey)
            ),
            succeeded: false,
            error: ocr_err.map(|e| e.to_string()),
            elapsed_ms: ocr_err.and_then(|e| e.elapsed_ms()),
        };
        self.terminal(doc, answer_text, extraction_elapsed_ms, debug, |report| {
            report.ocr = Some(ocr_debug);
        })
    }

    fn terminal(
        &self,
        doc: &DocumentRef,
        answer_text: String,
        extraction_elapsed_ms: u64,
        debug: bool,
        fill: impl FnOnce(&mut DebugReport),
    ) -> PipelineResponse {
        let debug_report = debug.then(|| {
            let mut report = DebugReport {
                media_type: doc.media_type.clone(),
                extraction_elapsed_ms,
                extraction_error: None,
                text_length: 0,
                text_preview: String::new(),
                sentence_preview: Vec::new(),
                ocr: None,
            };
            fill(&mut report);
            report
        });

        PipelineResponse {
            answer_text,
            snippets: Vec::new(),
            metadata: AnswerMetadata {
                document_name: doc.display_name.clone(),
                media_type: doc.media_type.clone(),
                sentence_count: 0,
                snippet_count: 0,
            },
            debug: debug_report,
        }
    }
}

/// First 200 characters with whitespace runs collapsed, for debug payloads.
fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(collapsed, TEXT_PREVIEW_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_collapses_and_caps() {
        let text = "a  b\n\nc ".repeat(100);
        let p = preview(&text);
        assert!(p.chars().count() <= 200);
        assert!(p.starts_with("a b c a b c"));
    }
}
