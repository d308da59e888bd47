//! Extraction behavior against real document bytes: PDF text layers, the
//! empty-layer sentinel, the page cap, and the supported-type dispatch.

mod common;

use common::{pdf_with_pages, FakeFetcher};
use skyvault::config::ExtractionConfig;
use skyvault::extract::{extract, extract_pdf_text, ExtractError, Extraction, MIME_PDF};
use skyvault::models::DocumentRef;

fn doc(url: &str, media_type: &str) -> DocumentRef {
    DocumentRef {
        remote_url: url.to_string(),
        media_type: media_type.to_string(),
        display_name: "fixture".to_string(),
    }
}

#[test]
fn pdf_text_layer_is_extracted_per_page() {
    let bytes = pdf_with_pages(&["alpha page text", "beta page text"]);
    let text = extract_pdf_text(&bytes, 25).unwrap();
    assert!(text.contains("alpha page text"), "got: {:?}", text);
    assert!(text.contains("beta page text"), "got: {:?}", text);
    // Page order is preserved.
    let alpha = text.find("alpha page text").unwrap();
    let beta = text.find("beta page text").unwrap();
    assert!(alpha < beta);
}

#[test]
fn pages_past_the_cap_are_silently_ignored() {
    let labels: Vec<String> = (1..=30).map(|i| format!("marker{:02} here", i)).collect();
    let refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
    let bytes = pdf_with_pages(&refs);

    let text = extract_pdf_text(&bytes, 25).unwrap();
    assert!(text.contains("marker01 here"));
    assert!(text.contains("marker25 here"));
    assert!(!text.contains("marker26 here"));
    assert!(!text.contains("marker30 here"));
}

#[tokio::test]
async fn empty_text_layer_yields_sentinel_not_empty_text() {
    let bytes = pdf_with_pages(&[""]);
    let fetcher = FakeFetcher::new().with_body("https://cdn.test/scan.pdf", bytes);

    let out = extract(
        &fetcher,
        &doc("https://cdn.test/scan.pdf", MIME_PDF),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(out, Extraction::EmptyTextLayer);
}

#[tokio::test]
async fn plain_text_roundtrips_below_the_cap() {
    let fetcher = FakeFetcher::new().with_body("https://cdn.test/notes.txt", "hello world");

    let out = extract(
        &fetcher,
        &doc("https://cdn.test/notes.txt", "text/plain"),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(out, Extraction::Text("hello world".to_string()));
}

#[tokio::test]
async fn oversized_text_is_truncated_to_exactly_the_cap() {
    let body = "a".repeat(150_050);
    let fetcher = FakeFetcher::new().with_body("https://cdn.test/big.txt", body);

    let out = extract(
        &fetcher,
        &doc("https://cdn.test/big.txt", "text/plain"),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap();
    match out {
        Extraction::Text(text) => assert_eq!(text.chars().count(), 150_000),
        other => panic!("expected text, got {:?}", other),
    }
}

#[tokio::test]
async fn unsupported_type_is_rejected_without_any_fetch() {
    let fetcher = FakeFetcher::new();

    let err = extract(
        &fetcher,
        &doc("https://cdn.test/archive.zip", "application/zip"),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ExtractError::UnsupportedType(ref mt) if mt == "application/zip"));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn non_2xx_fetch_surfaces_the_status_before_parsing() {
    let fetcher = FakeFetcher::new().with_status("https://cdn.test/gone.pdf", 410);

    let err = extract(
        &fetcher,
        &doc("https://cdn.test/gone.pdf", MIME_PDF),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExtractError::Fetch(410)));
}

#[tokio::test]
async fn garbage_pdf_bytes_fail_as_parse_error() {
    let fetcher = FakeFetcher::new().with_body("https://cdn.test/bad.pdf", "definitely not a pdf");

    let err = extract(
        &fetcher,
        &doc("https://cdn.test/bad.pdf", MIME_PDF),
        &ExtractionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExtractError::PdfParse(_)));
}
