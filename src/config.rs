use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse {var} as {expected_type}: {source}")]
    ParseError {
        var: String,
        expected_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Configuration for logging functionality
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub rust_log: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            rust_log: "info".to_string(),
        }
    }
}

/// Configuration for request stores
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Buffer size of every change-notification channel
    pub events_capacity: usize,
    /// Upper bound of the disabled store; oldest entries go first
    pub max_disabled: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            events_capacity: 64,
            max_disabled: 256,
        }
    }
}

/// Configuration for persistence
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub file: Option<PathBuf>,
}

/// Main configuration container
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub log: LogConfig,
    pub search: SearchConfig,
    pub storage: StorageConfig,
}

fn parse_usize(var: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|e| ConfigError::ParseError {
        var: var.to_string(),
        expected_type: "usize".to_string(),
        source: Box::new(e),
    })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // CHIPMUNK_EVENTS_CAPACITY
        if let Ok(capacity) = std::env::var("CHIPMUNK_EVENTS_CAPACITY") {
            config.search.events_capacity = parse_usize("CHIPMUNK_EVENTS_CAPACITY", &capacity)?;
        }

        // CHIPMUNK_MAX_DISABLED
        if let Ok(max_disabled) = std::env::var("CHIPMUNK_MAX_DISABLED") {
            config.search.max_disabled = parse_usize("CHIPMUNK_MAX_DISABLED", &max_disabled)?;
        }

        // CHIPMUNK_STORAGE_FILE
        if let Ok(file) = std::env::var("CHIPMUNK_STORAGE_FILE")
            && !file.trim().is_empty()
        {
            config.storage.file = Some(PathBuf::from(file));
        }

        // RUST_LOG
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.log.rust_log = rust_log;
        }

        // Validation
        if config.search.events_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CHIPMUNK_EVENTS_CAPACITY".to_string(),
                message: "capacity must be greater than 0".to_string(),
            });
        }

        if config.search.max_disabled == 0 {
            return Err(ConfigError::InvalidValue {
                var: "CHIPMUNK_MAX_DISABLED".to_string(),
                message: "disabled store size must be greater than 0".to_string(),
            });
        }

        Ok(config)
    }
}
