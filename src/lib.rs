//! # SkyVault Document Q&A
//!
//! The document question-answering pipeline behind SkyVault's "ask about this
//! file" feature: fetch a stored document from its CDN URL, extract its text
//! (plain text, PDF text layer, or Word), fall back to a hosted OCR service
//! for scanned PDFs, and answer the user's question with a keyword-scoring
//! heuristic over the extracted sentences.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────────┐   ┌─────────────┐
//! │  Store    │──▶│ Extractor │──▶│ OCR (fallback, │──▶│  Answer      │
//! │ (id→URL)  │   │ text/pdf/ │   │ scanned PDFs   │   │  synthesizer │
//! └──────────┘   │ docx      │   │ only)          │   └─────────────┘
//!                └───────────┘   └────────────────┘
//! ```
//!
//! All network collaborators sit behind traits ([`fetch::DocumentFetcher`],
//! [`ocr::OcrEngine`], [`store::DocumentStore`]), so the pipeline runs
//! unchanged against in-memory fakes in tests.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`fetch`] | Remote document retrieval |
//! | [`extract`] | Text / PDF / Word extraction |
//! | [`ocr`] | OCR provider client |
//! | [`answer`] | Heuristic answer synthesis |
//! | [`store`] | Document record lookup |
//! | [`pipeline`] | Orchestration and response assembly |
//! | [`server`] | HTTP API |

pub mod answer;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod server;
pub mod store;
