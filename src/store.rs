//! Document record lookup.
//!
//! The real SkyVault file store lives behind its own service; this module
//! models only the read boundary the answer pipeline needs: resolve an opaque
//! document id to its CDN URL, media type, display name, owner, and folder
//! flag. [`ManifestStore`] is a TOML-backed in-memory implementation used by
//! the standalone server and by tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::DocumentRef;

/// One entry in the document store.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    /// Opaque owner identity, as supplied by the external auth provider.
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_folder: bool,
}

impl DocumentRecord {
    pub fn to_document_ref(&self) -> DocumentRef {
        DocumentRef {
            remote_url: self.url.clone(),
            media_type: self.media_type.clone(),
            display_name: self.name.clone(),
        }
    }
}

/// Read access to document records by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, id: &str) -> Option<DocumentRecord>;
}

/// In-memory store seeded from a TOML manifest:
///
/// ```toml
/// [[documents]]
/// id = "doc-1"
/// owner = "user-42"
/// name = "report.pdf"
/// media_type = "application/pdf"
/// url = "https://cdn.example.com/doc-1"
/// ```
pub struct ManifestStore {
    by_id: HashMap<String, DocumentRecord>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    documents: Vec<DocumentRecord>,
}

impl ManifestStore {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document manifest: {}", path.display()))?;
        let manifest: Manifest =
            toml::from_str(&content).with_context(|| "Failed to parse document manifest")?;
        Ok(Self::from_records(manifest.documents))
    }

    pub fn from_records(records: Vec<DocumentRecord>) -> Self {
        let by_id = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { by_id }
    }

    /// Empty store; every lookup is a miss.
    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl DocumentStore for ManifestStore {
    async fn find(&self, id: &str) -> Option<DocumentRecord> {
        self.by_id.get(id).cloned()
    }
}
