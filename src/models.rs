//! Core data types shared across the extraction and answer pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to a stored document, as supplied by the file store.
/// Immutable for the duration of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct DocumentRef {
    /// CDN URL the document bytes can be fetched from.
    pub remote_url: String,
    /// Declared MIME type (e.g. `application/pdf`).
    pub media_type: String,
    /// User-visible file name, used in answer metadata.
    pub display_name: String,
}

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One message in the conversation accompanying an answer request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The most recent user-authored message, which is the question the pipeline
/// answers. `None` is a caller-contract violation and must be rejected before
/// the pipeline runs.
pub fn latest_user_question(conversation: &[Message]) -> Option<&str> {
    conversation
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}
