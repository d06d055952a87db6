//! Server configuration (data file, bind address, lookup sources).

use std::path::PathBuf;

use reading_log_core::config::{load_config, AppConfig, LookupConfig};

/// Configuration for the reading-log server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// JSON file holding reading records.
    pub data_file: PathBuf,
    /// Host:port to bind (e.g. "127.0.0.1:5000" or "0.0.0.0:5000").
    pub bind: String,
    /// Metadata sources used by the ISBN routes.
    pub lookup: LookupConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl ServerConfig {
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            data_file: app.storage.data_file_path(),
            bind: "127.0.0.1:5000".to_string(),
            lookup: app.lookup.clone(),
        }
    }

    /// Build config from the config file, then the environment.
    /// - `READING_LOG_DATA_FILE`: JSON file for reading records
    /// - `READING_LOG_BIND`: host:port (default: 127.0.0.1:5000)
    pub fn from_env() -> Self {
        let mut c = Self::from_app_config(&load_config());
        if let Ok(p) = std::env::var("READING_LOG_DATA_FILE") {
            c.data_file = PathBuf::from(p);
        }
        if let Ok(b) = std::env::var("READING_LOG_BIND") {
            c.bind = b;
        }
        c
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind
    }
}
