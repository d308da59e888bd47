//! HTTP API for the answer pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/answer` | Ask a question about a stored document |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Transport-level problems (malformed request shape, no user message,
//! unknown or foreign document, folders) are rejected with 4xx before the
//! pipeline runs, as:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "conversation must not be empty" } }
//! ```
//!
//! Everything that goes wrong *inside* the pipeline (unsupported type, fetch
//! failure, parse failure, OCR failure) is a 200 whose `answer_text` explains
//! the problem conversationally.
//!
//! # Identity
//!
//! Authentication is handled upstream; this server trusts the opaque caller
//! identity in the `x-user-id` header and only checks it against the stored
//! document owner. An owner mismatch answers 404, indistinguishable from a
//! missing document, so document ids are not probeable.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::models::{latest_user_question, Message};
use crate::pipeline::{AnswerPipeline, PipelineResponse};
use crate::store::{DocumentRecord, DocumentStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<AnswerPipeline>,
    store: Arc<dyn DocumentStore>,
}

/// Starts the HTTP server and runs until the process is terminated.
pub async fn run_server(
    config: &Config,
    store: Arc<dyn DocumentStore>,
    pipeline: Arc<AnswerPipeline>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState { pipeline, store };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/answer", post(handle_answer))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("SkyVault answer API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /answer ============

/// Request body for `POST /answer`.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub document_id: String,
    pub conversation: Vec<Message>,
    #[serde(default)]
    pub debug: bool,
}

/// Everything checked before the pipeline is allowed to run. Returns the
/// resolved document record on success.
fn validate_request(
    request: &AnswerRequest,
    caller: Option<&str>,
    record: Option<DocumentRecord>,
) -> Result<DocumentRecord, AppError> {
    let caller = caller.ok_or_else(|| bad_request("missing x-user-id header"))?;
    if request.document_id.trim().is_empty() {
        return Err(bad_request("document_id must not be empty"));
    }
    if request.conversation.is_empty() {
        return Err(bad_request("conversation must not be empty"));
    }
    if latest_user_question(&request.conversation).is_none() {
        return Err(bad_request("conversation contains no user message"));
    }

    let record = record
        .filter(|r| r.owner == caller)
        .ok_or_else(|| not_found(format!("document not found: {}", request.document_id)))?;
    if record.is_folder {
        return Err(bad_request("document is a folder, not a file"));
    }
    Ok(record)
}

async fn handle_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<PipelineResponse>, AppError> {
    let caller = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty());

    let record = state.store.find(&request.document_id).await;
    let record = validate_request(&request, caller, record)?;

    let doc = record.to_document_ref();
    let response = state
        .pipeline
        .answer_about_document(&doc, &request.conversation, request.debug)
        .await
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn record(owner: &str, is_folder: bool) -> DocumentRecord {
        DocumentRecord {
            id: "doc-1".to_string(),
            owner: owner.to_string(),
            name: "report.pdf".to_string(),
            media_type: "application/pdf".to_string(),
            url: "https://cdn.example.com/doc-1".to_string(),
            is_folder,
        }
    }

    fn request(conversation: Vec<Message>) -> AnswerRequest {
        AnswerRequest {
            document_id: "doc-1".to_string(),
            conversation,
            debug: false,
        }
    }

    fn user_msg(content: &str) -> Message {
        Message {
            role: Role::User,
            content: content.to_string(),
            timestamp: None,
        }
    }

    fn assistant_msg(content: &str) -> Message {
        Message {
            role: Role::Assistant,
            content: content.to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn valid_request_resolves_record() {
        let out = validate_request(
            &request(vec![user_msg("what is this?")]),
            Some("user-42"),
            Some(record("user-42", false)),
        );
        assert_eq!(out.unwrap().id, "doc-1");
    }

    #[test]
    fn missing_identity_is_bad_request() {
        let err = validate_request(
            &request(vec![user_msg("q")]),
            None,
            Some(record("user-42", false)),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_conversation_is_bad_request() {
        let err = validate_request(&request(vec![]), Some("user-42"), Some(record("user-42", false)))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conversation_without_user_message_is_bad_request() {
        let err = validate_request(
            &request(vec![assistant_msg("hello")]),
            Some("user-42"),
            Some(record("user-42", false)),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("no user message"));
    }

    #[test]
    fn unknown_document_is_not_found() {
        let err =
            validate_request(&request(vec![user_msg("q")]), Some("user-42"), None).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn foreign_document_is_indistinguishable_from_missing() {
        let err = validate_request(
            &request(vec![user_msg("q")]),
            Some("someone-else"),
            Some(record("user-42", false)),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
    }

    #[test]
    fn folder_is_bad_request() {
        let err = validate_request(
            &request(vec![user_msg("q")]),
            Some("user-42"),
            Some(record("user-42", true)),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("folder"));
    }
}
