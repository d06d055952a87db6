/// Top-level error type for callers that mix lookup, config and I/O.
#[derive(Debug, thiserror::Error)]
pub enum ReadingLogError {
    #[error("Metadata lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single metadata source. The resolver swallows these and
/// falls through to the next source.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider {provider} timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    #[error("Provider {provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("Provider {provider} returned a malformed payload: {detail}")]
    Malformed { provider: String, detail: String },

    #[error("No results found for query")]
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
