//! # SkyVault CLI (`skyvault`)
//!
//! Entry points for the document question-answering pipeline.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `skyvault serve` | Start the HTTP answer API |
//! | `skyvault ask` | Run the pipeline once against a document URL |
//!
//! ## Examples
//!
//! ```bash
//! # Serve documents listed in a manifest
//! skyvault --config ./skyvault.toml serve
//!
//! # One-shot question against a PDF
//! skyvault ask \
//!     --url https://cdn.example.com/report.pdf \
//!     --media-type application/pdf \
//!     --question "what were the quarterly results" \
//!     --debug
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use skyvault::config::load_config_or_default;
use skyvault::models::{DocumentRef, Message, Role};
use skyvault::pipeline::AnswerPipeline;
use skyvault::server::run_server;
use skyvault::store::ManifestStore;

/// SkyVault document Q&A: extract text from stored documents and answer
/// questions about them.
#[derive(Parser)]
#[command(name = "skyvault", version)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP answer API.
    Serve,
    /// Ask one question about a document by URL and print the answer.
    Ask {
        /// Remote URL of the document.
        #[arg(long)]
        url: String,
        /// Declared MIME type (e.g. application/pdf).
        #[arg(long)]
        media_type: String,
        /// Display name used in answer metadata.
        #[arg(long, default_value = "document")]
        name: String,
        /// The question to answer.
        #[arg(long)]
        question: String,
        /// Include the debug telemetry payload in the output.
        #[arg(long)]
        debug: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => {
            let store = match &config.documents.manifest {
                Some(path) => {
                    let store = ManifestStore::load(path)?;
                    println!("Loaded {} document(s) from {}", store.len(), path.display());
                    store
                }
                None => {
                    eprintln!("Warning: no [documents].manifest configured; every lookup will 404");
                    ManifestStore::empty()
                }
            };
            let pipeline = AnswerPipeline::from_config(&config)?;
            run_server(&config, Arc::new(store), Arc::new(pipeline)).await
        }
        Command::Ask {
            url,
            media_type,
            name,
            question,
            debug,
        } => {
            let pipeline = AnswerPipeline::from_config(&config)?;
            let doc = DocumentRef {
                remote_url: url,
                media_type,
                display_name: name,
            };
            let conversation = vec![Message {
                role: Role::User,
                content: question,
                timestamp: Some(chrono::Utc::now()),
            }];

            let response = pipeline.answer_about_document(&doc, &conversation, debug).await?;

            println!("{}", response.answer_text);
            if !response.snippets.is_empty() {
                println!(
                    "\n({} of {} sentence(s) matched)",
                    response.metadata.snippet_count, response.metadata.sentence_count
                );
            }
            if let Some(report) = response.debug {
                println!("\ndebug: {}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
    }
}
