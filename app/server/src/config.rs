//! FILENAME: app/server/src/config.rs
// PURPOSE: Server configuration with environment overrides.
// CONTEXT: Every field has a default; GROUPSHEET_* variables override them.
// Invalid values stop startup with an error naming the variable.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use log::LevelFilter;
use thiserror::Error;

pub const ENV_ADDR: &str = "GROUPSHEET_ADDR";
pub const ENV_MAX_ROWS: &str = "GROUPSHEET_MAX_ROWS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "GROUPSHEET_MAX_UPLOAD_BYTES";
pub const ENV_STORE: &str = "GROUPSHEET_STORE";
pub const ENV_LOG_FILE: &str = "GROUPSHEET_LOG_FILE";
pub const ENV_LOG_LEVEL: &str = "GROUPSHEET_LOG_LEVEL";
pub const ENV_ALLOW_ORIGIN: &str = "GROUPSHEET_ALLOW_ORIGIN";

#[derive(Debug, Error, PartialEq)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Data rows kept from one upload.
    pub max_upload_rows: usize,
    /// Request body limit for uploads.
    pub max_upload_bytes: usize,
    /// JSON file backing the row store; in-memory when unset.
    pub store_path: Option<PathBuf>,
    /// Log file; stdout only when unset.
    pub log_path: Option<PathBuf>,
    pub log_level: LevelFilter,
    /// Single allowed CORS origin; any origin when unset.
    pub allow_origin: Option<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_upload_rows: persistence::DEFAULT_MAX_ROWS,
            max_upload_bytes: 10 * 1024 * 1024,
            store_path: None,
            log_path: None,
            log_level: LevelFilter::Info,
            allow_origin: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = get(ENV_ADDR) {
            config.bind_addr = value
                .parse()
                .map_err(|e: std::net::AddrParseError| invalid(ENV_ADDR, &value, e))?;
        }
        if let Some(value) = get(ENV_MAX_ROWS) {
            config.max_upload_rows = parse_positive(ENV_MAX_ROWS, &value)?;
        }
        if let Some(value) = get(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = parse_positive(ENV_MAX_UPLOAD_BYTES, &value)?;
        }
        if let Some(value) = get(ENV_STORE) {
            config.store_path = Some(PathBuf::from(value));
        }
        if let Some(value) = get(ENV_LOG_FILE) {
            config.log_path = Some(PathBuf::from(value));
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = value
                .parse()
                .map_err(|e: log::ParseLevelError| invalid(ENV_LOG_LEVEL, &value, e))?;
        }
        if let Some(value) = get(ENV_ALLOW_ORIGIN) {
            config.allow_origin = Some(
                HeaderValue::from_str(&value).map_err(|e| invalid(ENV_ALLOW_ORIGIN, &value, e))?,
            );
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(0) => Err(invalid(var, value, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(var, value, e)),
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
