//! Centralized configuration for the console app.
//!
//! All environment variables are loaded and validated at startup to fail
//! fast on misconfiguration rather than mid-session.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Storage backend provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// In-memory storage (data lost on exit)
    Memory,
    /// SQLite file-based storage
    Sqlite,
}

impl StorageProvider {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("sqlite") {
            Self::Sqlite
        } else {
            Self::Memory
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error for {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// App configuration loaded from environment variables.
///
/// All fields are validated at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Storage provider
    pub storage_provider: StorageProvider,
    /// SQLite database path (when using sqlite storage)
    #[allow(dead_code)] // Read again by SqliteStore::from_env at build time
    pub db_path: Option<PathBuf>,
    /// Log format
    pub log_format: LogFormat,
    /// Base URL of the postal-code lookup service
    pub lookup_base_url: String,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on invalid configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Storage provider
        let storage_provider = StorageProvider::from_str(
            &env::var("STORAGE_PROVIDER").unwrap_or_else(|_| "sqlite".into()),
        );

        // DB path (for sqlite)
        let db_path = env::var("DB_PATH").ok().map(PathBuf::from);

        // Log format
        let log_format =
            LogFormat::from_str(&env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()));

        // Lookup endpoint
        let lookup_base_url = env::var("VIACEP_BASE_URL")
            .unwrap_or_else(|_| "https://viacep.com.br/ws".into());
        if !valid_base_url(&lookup_base_url) {
            return Err(ConfigError {
                field: "VIACEP_BASE_URL",
                message: format!("must be an http(s) URL, got '{}'", lookup_base_url),
            });
        }

        Ok(Self {
            storage_provider,
            db_path,
            log_format,
            lookup_base_url,
        })
    }
}

fn valid_base_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
