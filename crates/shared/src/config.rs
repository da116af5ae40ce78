//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Movement engine configuration.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Movement engine settings.
///
/// Timeouts bound the advisory calls to the stock oracle and the
/// location/item directories. When a call exceeds its budget the engine
/// logs a warning and proceeds.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Whether stock availability is pre-checked at movement creation.
    #[serde(default = "default_stock_validation_enabled")]
    pub stock_validation_enabled: bool,
    /// Budget for a single stock-availability call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub stock_check_timeout_ms: u64,
    /// Budget for a single directory lookup, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub directory_timeout_ms: u64,
    /// Time-to-live of cached directory entries, in seconds.
    #[serde(default = "default_directory_cache_ttl")]
    pub directory_cache_ttl_secs: u64,
    /// Maximum number of cached directory entries.
    #[serde(default = "default_directory_cache_capacity")]
    pub directory_cache_capacity: u64,
}

fn default_stock_validation_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_directory_cache_ttl() -> u64 {
    60
}

fn default_directory_cache_capacity() -> u64 {
    10_000
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stock_validation_enabled: default_stock_validation_enabled(),
            stock_check_timeout_ms: default_timeout_ms(),
            directory_timeout_ms: default_timeout_ms(),
            directory_cache_ttl_secs: default_directory_cache_ttl(),
            directory_cache_capacity: default_directory_cache_capacity(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "stockflow=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("STOCKFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Parses configuration from a TOML document with the same defaults as
    /// [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or lacks a required key.
    pub fn from_toml(document: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
