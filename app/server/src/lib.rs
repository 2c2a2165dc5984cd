//! FILENAME: app/server/src/lib.rs
// PURPOSE: Main library entry point (HTTP server).
// CONTEXT: Shared state is one row store behind a mutex. Handlers lock it,
// copy out what they need and release it before any further work.

use std::sync::{Arc, Mutex};

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use engine::{JsonFileRowStore, MemoryRowStore, RowStore, StoreError};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub mod api_types;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use api_types::{AnalyzeRequest, ExportAnalysisRequest, GroupsQuery, SaveRowsRequest};
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ErrorBody};
pub use logging::{init_log_file, install_logger, next_seq, write_log};

use api_types::HealthResponse;

// ============================================================================
// APPLICATION STATE
// ============================================================================

pub struct AppState {
    /// The uploaded rows; replaced wholesale on every save.
    pub store: Mutex<Box<dyn RowStore>>,
    pub config: ServerConfig,
}

impl AppState {
    /// Runs `f` with the store locked. A poisoned lock is a storage error.
    pub fn with_store<T>(
        &self,
        f: impl FnOnce(&mut dyn RowStore) -> Result<T, StoreError>,
    ) -> Result<T, ApiError> {
        let mut store = self.store.lock().map_err(|_| ApiError::lock_poisoned())?;
        Ok(f(&mut **store)?)
    }
}

/// State with default configuration and an in-memory store.
pub fn create_app_state() -> AppState {
    create_app_state_with(ServerConfig::default())
}

/// State for `config`: a JSON file store when a store path is set.
pub fn create_app_state_with(config: ServerConfig) -> AppState {
    let store: Box<dyn RowStore> = match &config.store_path {
        Some(path) => {
            log_info!("SYS", "Using file row store at {}", path.display());
            Box::new(JsonFileRowStore::new(path.clone()))
        }
        None => {
            log_info!("SYS", "Using in-memory row store");
            Box::new(MemoryRowStore::new())
        }
    };

    AppState {
        store: Mutex::new(store),
        config,
    }
}

// ============================================================================
// ROUTER
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn not_found() -> ApiError {
    ApiError::Rejected {
        status: StatusCode::NOT_FOUND,
        message: "Not found".to_string(),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = match &state.config.allow_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        // Rows
        .route("/upload", post(commands::upload_file))
        .route("/save", post(commands::save_rows))
        .route("/clear", post(commands::clear_rows))
        .route("/headers", get(commands::get_headers))
        // Analysis
        .route("/analyze", post(commands::analyze))
        .route("/export-analysis", post(commands::export_analysis))
        // Legacy single-column groups
        .route("/groups", get(commands::get_groups))
        .route("/export-groups", get(commands::export_groups))
        .fallback(not_found)
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// STARTUP
// ============================================================================

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads configuration from the environment and serves until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;

    install_logger(config.log_level);
    if let Some(path) = &config.log_path {
        match init_log_file(path) {
            Ok(()) => log_info!("SYS", "Logging to {}", path.display()),
            Err(e) => {
                eprintln!("[LOG_INIT] FAILED: {}", e);
                eprintln!("[LOG_INIT] Continuing with console-only logging");
            }
        }
    }

    let addr = config.bind_addr;
    let state = Arc::new(create_app_state_with(config));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    log_info!("SYS", "GroupSheet server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info!("SYS", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_error!("SYS", "Failed to listen for shutdown signal: {}", e);
    }
}
