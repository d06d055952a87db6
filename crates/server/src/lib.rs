//! Reading-log HTTP server.
//!
//! Exposes ISBN metadata lookup (openBD first, NDL Search as fallback) and a
//! small CRUD API over reading-progress records kept in a JSON file. All
//! routes answer with permissive CORS headers so a browser front end on any
//! origin can call them.

pub mod api;
pub mod config;
pub mod storage;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::storage::JsonFileStore;

/// Shared application state (record store and config).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonFileStore>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> std::io::Result<Self> {
        let store = JsonFileStore::new(config.data_file.clone());
        store.ensure_file()?;
        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }
}

/// Build API routes with state.
pub fn api_routes(state: AppState) -> Router {
    api::routes(state)
}

/// API routes plus CORS and request tracing, as served by the binary.
pub fn app(state: AppState) -> Router {
    api_routes(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
