//! HTTP API routes: ISBN lookup, reading records, health.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use reading_log_core::isbn::normalize;
use reading_log_core::lookup::MetadataResolver;
use reading_log_core::reading::{ReadingPatch, ReadingRecord};
use reading_log_core::record::BookRecord;

use crate::AppState;

/// Query params for GET /api/book-info
#[derive(Debug, serde::Deserialize)]
pub struct BookInfoQuery {
    pub isbn: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/book/:isbn", get(lookup_book))
        .route("/api/book-info", get(lookup_book_info))
        .route("/api/books", get(list_books).post(create_book))
        .route("/api/books/:id", get(get_book).put(update_book).delete(delete_book))
        .route("/health", get(health))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn lookup_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookRecord>, ApiError> {
    resolve(&state, isbn).await.map(Json)
}

async fn lookup_book_info(
    State(state): State<AppState>,
    Query(q): Query<BookInfoQuery>,
) -> Result<Json<BookRecord>, ApiError> {
    let isbn = q
        .isbn
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("isbn parameter is required".to_string()))?;
    resolve(&state, isbn).await.map(Json)
}

/// Normalize, check length, and run the blocking resolver off the async runtime.
async fn resolve(state: &AppState, raw: String) -> Result<BookRecord, ApiError> {
    let isbn = normalize(&raw);
    if !isbn.meets_min_length() {
        return Err(ApiError::BadRequest(format!("invalid ISBN: {raw}")));
    }
    let lookup = state.config.lookup.clone();
    let found = tokio::task::spawn_blocking(move || {
        MetadataResolver::from_config(&lookup).map(|resolver| resolver.resolve(&isbn))
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    found.ok_or(ApiError::BookNotFound { isbn: raw })
}

async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<ReadingRecord>>, ApiError> {
    Ok(Json(state.store.list()?))
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReadingRecord>, ApiError> {
    state.store.get(&id)?.map(Json).ok_or(ApiError::NotFound(id))
}

async fn create_book(
    State(state): State<AppState>,
    Json(patch): Json<ReadingPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.store.create(ReadingRecord::from(patch))?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ReadingPatch>,
) -> Result<Json<ReadingRecord>, ApiError> {
    state.store.update(&id, patch)?.map(Json).ok_or(ApiError::NotFound(id))
}

async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.store.delete(&id)? {
        Ok(Json(json!({ "message": "Book deleted" })))
    } else {
        Err(ApiError::NotFound(id))
    }
}

#[derive(Debug)]
enum ApiError {
    Io(std::io::Error),
    NotFound(String),
    BookNotFound { isbn: String },
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::AlreadyExists => ApiError::Conflict(e.to_string()),
            _ => ApiError::Io(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            ApiError::NotFound(id) => (StatusCode::NOT_FOUND, json!({ "error": "Book not found", "id": id })),
            ApiError::BookNotFound { isbn } => {
                (StatusCode::NOT_FOUND, json!({ "error": "Book not found", "isbn": isbn }))
            }
            ApiError::BadRequest(s) => (StatusCode::BAD_REQUEST, json!({ "error": s })),
            ApiError::Conflict(s) => (StatusCode::CONFLICT, json!({ "error": s })),
            ApiError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() })),
            ApiError::Internal(s) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": s })),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Io(e) => write!(f, "{}", e),
            ApiError::NotFound(s) => write!(f, "not found: {}", s),
            ApiError::BookNotFound { isbn } => write!(f, "no book for ISBN {}", isbn),
            ApiError::BadRequest(s) => write!(f, "bad request: {}", s),
            ApiError::Conflict(s) => write!(f, "conflict: {}", s),
            ApiError::Internal(s) => write!(f, "internal error: {}", s),
        }
    }
}
