//! Config file parsing for `~/.config/reading-log/config.toml`.
//!
//! A missing or unparsable file yields [`AppConfig::default`], so every binary
//! runs without any configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_OPENBD_ENDPOINT: &str = "https://api.openbd.jp/v1/get";
pub const DEFAULT_NDL_ENDPOINT: &str = "https://ndlsearch.ndl.go.jp/api/sru";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// A metadata source the resolver can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Openbd,
    Ndl,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openbd" => Ok(SourceKind::Openbd),
            "ndl" => Ok(SourceKind::Ndl),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_openbd_endpoint")]
    pub openbd_endpoint: String,
    #[serde(default = "default_ndl_endpoint")]
    pub ndl_endpoint: String,
    /// Per-request timeout for each source.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Priority order; the first source to find the book wins.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceKind>,
}

fn default_openbd_endpoint() -> String {
    DEFAULT_OPENBD_ENDPOINT.to_string()
}
fn default_ndl_endpoint() -> String {
    DEFAULT_NDL_ENDPOINT.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_sources() -> Vec<SourceKind> {
    vec![SourceKind::Openbd, SourceKind::Ndl]
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            openbd_endpoint: default_openbd_endpoint(),
            ndl_endpoint: default_ndl_endpoint(),
            timeout_secs: default_timeout_secs(),
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding reading records. `None` uses [`default_data_file`].
    pub data_file: Option<String>,
}

impl StorageConfig {
    pub fn data_file_path(&self) -> PathBuf {
        self.data_file
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_data_file)
    }
}

/// `<data_local_dir>/reading-log/books.json`, or `./data/books.json`.
pub fn default_data_file() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("reading-log").join("books.json"))
        .unwrap_or_else(|| PathBuf::from("./data/books.json"))
}

/// Return the default config file path (for init and show).
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let mut p = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    p.push("reading-log");
    p.push("config.toml");
    Ok(p)
}

/// Load config from the default path, falling back to defaults.
pub fn load_config() -> AppConfig {
    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(error = %e, "using default config");
            return AppConfig::default();
        }
    };
    load_config_from(&path).unwrap_or_else(|e| {
        match &e {
            ConfigError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults")
            }
            _ => tracing::warn!(path = %path.display(), error = %e, "ignoring config file"),
        }
        AppConfig::default()
    })
}

/// Read and validate a config file.
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    cfg.validate()?;
    Ok(cfg)
}

impl AppConfig {
    /// Reject values no source can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookup.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "lookup.timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

pub fn save_config_to(cfg: &AppConfig, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

/// Set one dotted key, e.g. `lookup.timeout_secs`.
pub fn set_config_key(cfg: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    let parts: Vec<&str> = key.splitn(2, '.').collect();
    match parts.as_slice() {
        ["lookup", sub] => match *sub {
            "openbd_endpoint" => cfg.lookup.openbd_endpoint = value.to_string(),
            "ndl_endpoint" => cfg.lookup.ndl_endpoint = value.to_string(),
            "timeout_secs" => {
                cfg.lookup.timeout_secs = value.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(invalid)?;
            }
            "sources" => {
                cfg.lookup.sources = value
                    .split(',')
                    .map(str::parse::<SourceKind>)
                    .collect::<Result<_, _>>()
                    .map_err(|_| invalid())?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        },
        ["storage", "data_file"] => cfg.storage.data_file = Some(value.to_string()),
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }
    Ok(())
}
