use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable consulted when `[ocr].api_key` is not set in the file.
pub const OCR_API_KEY_ENV: &str = "OCR_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

/// Bounds applied during text extraction. The defaults mirror the SkyVault
/// production limits; downstream code depends on them being enforced.
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Extracted (or OCR'd) text is truncated to this many characters before
    /// answer synthesis.
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// PDF text-layer extraction stops after this many pages; later pages are
    /// silently ignored.
    #[serde(default = "default_max_pdf_pages")]
    pub max_pdf_pages: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            max_pdf_pages: default_max_pdf_pages(),
        }
    }
}

fn default_max_text_chars() -> usize {
    150_000
}
fn default_max_pdf_pages() -> usize {
    25
}

/// Tuning knobs for the heuristic answer synthesizer.
#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    /// At most this many distinct question keywords are scored.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
    /// At most this many supporting snippets are returned.
    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,
    /// Question tokens shorter than this are not keywords.
    #[serde(default = "default_min_keyword_chars")]
    pub min_keyword_chars: usize,
    /// Keywords longer than this score double weight per occurrence.
    #[serde(default = "default_long_keyword_chars")]
    pub long_keyword_chars: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            max_keywords: default_max_keywords(),
            max_snippets: default_max_snippets(),
            min_keyword_chars: default_min_keyword_chars(),
            long_keyword_chars: default_long_keyword_chars(),
        }
    }
}

fn default_max_keywords() -> usize {
    25
}
fn default_max_snippets() -> usize {
    5
}
fn default_min_keyword_chars() -> usize {
    3
}
fn default_long_keyword_chars() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_endpoint")]
    pub endpoint: String,
    /// Provider API key. Falls back to the `OCR_API_KEY` environment variable
    /// when unset; when neither is present, OCR is skipped rather than failing
    /// startup.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ocr_language")]
    pub language: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ocr_endpoint(),
            api_key: None,
            language: default_ocr_language(),
            timeout_secs: default_ocr_timeout_secs(),
        }
    }
}

fn default_ocr_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}
fn default_ocr_language() -> String {
    "eng".to_string()
}
fn default_ocr_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DocumentsConfig {
    /// Optional TOML manifest of serveable documents (see [`crate::store`]).
    pub manifest: Option<std::path::PathBuf>,
}

impl OcrConfig {
    /// Effective API key: config value first, then the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(OCR_API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.is_empty())
            })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load the config at `path`, or fall back to defaults when no path is given.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.extraction.max_text_chars == 0 {
        anyhow::bail!("extraction.max_text_chars must be > 0");
    }
    if config.extraction.max_pdf_pages == 0 {
        anyhow::bail!("extraction.max_pdf_pages must be > 0");
    }
    if config.answer.max_snippets == 0 {
        anyhow::bail!("answer.max_snippets must be > 0");
    }
    if config.answer.max_keywords == 0 {
        anyhow::bail!("answer.max_keywords must be > 0");
    }
    if config.answer.min_keyword_chars == 0 {
        anyhow::bail!("answer.min_keyword_chars must be > 0");
    }
    if config.fetch.timeout_secs == 0 || config.ocr.timeout_secs == 0 {
        anyhow::bail!("fetch.timeout_secs and ocr.timeout_secs must be > 0");
    }
    if config.ocr.endpoint.trim().is_empty() {
        anyhow::bail!("ocr.endpoint must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_production_limits() {
        let config = Config::default();
        assert_eq!(config.extraction.max_text_chars, 150_000);
        assert_eq!(config.extraction.max_pdf_pages, 25);
        assert_eq!(config.answer.max_keywords, 25);
        assert_eq!(config.answer.max_snippets, 5);
        assert_eq!(config.answer.min_keyword_chars, 3);
        assert_eq!(config.answer.long_keyword_chars, 6);
        assert_eq!(config.ocr.language, "eng");
    }

    #[test]
    fn empty_file_parses_to_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"").unwrap();
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn zero_page_cap_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"[extraction]\nmax_pdf_pages = 0\n").unwrap();
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("max_pdf_pages"));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"[extraction]\nmax_pdf_pages = 10\n[ocr]\nlanguage = \"fre\"\n")
            .unwrap();
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.extraction.max_pdf_pages, 10);
        assert_eq!(config.extraction.max_text_chars, 150_000);
        assert_eq!(config.ocr.language, "fre");
    }
}
