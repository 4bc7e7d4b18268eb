//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fragment loader configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    /// Origin that relative fragment URLs are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Container whose scripts are re-executed; empty disables activation
    #[serde(default = "default_activation_container")]
    pub activation_container: Option<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Environment variable holding the bearer token, if any
    #[serde(default)]
    pub token_env: Option<String>,

    /// Container id → fragment URL
    #[serde(default = "default_fragments")]
    pub fragments: BTreeMap<String, String>,
}

fn default_base_url() -> String {
    "http://localhost:5500".to_string()
}

fn default_activation_container() -> Option<String> {
    Some(crate::loader::DEFAULT_ACTIVATION_CONTAINER.to_string())
}

fn default_fetch_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_event_capacity() -> usize {
    256
}

fn default_fragments() -> BTreeMap<String, String> {
    [
        ("sidebar", "/partials/sidebar.html"),
        ("navbar", "/partials/navbar.html"),
        ("vendorjs", "/partials/vendor.html"),
    ]
    .into_iter()
    .map(|(id, url)| (id.to_string(), url.to_string()))
    .collect()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            activation_container: default_activation_container(),
            fetch_timeout_ms: default_fetch_timeout(),
            event_capacity: default_event_capacity(),
            token_env: None,
            fragments: default_fragments(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        // TOML has no null; an empty id switches activation off
        if config.loader.activation_container.as_deref() == Some("") {
            config.loader.activation_container = None;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Default config file locations, in lookup order
    pub fn default_locations() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("partials").join("config.toml")),
            Some(PathBuf::from("./partials.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// First default location that exists
    pub fn default_path() -> Option<PathBuf> {
        first_existing(Self::default_locations())
    }

    /// Load from the first existing default location, or from the
    /// environment alone when there is none.
    ///
    /// A config file that exists but cannot be read or parsed is an error
    /// rather than a silent fallback to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_first(Self::default_locations())
    }

    fn load_first(paths: impl IntoIterator<Item = PathBuf>) -> Result<Self, ConfigError> {
        match first_existing(paths) {
            Some(path) => Self::load_with_env(&path),
            None => Ok(Self::from_env()),
        }
    }

    /// Reject values the loader cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "loader.fetch_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.loader.event_capacity == 0 {
            return Err(ConfigError::Invalid(
                "loader.event_capacity must be greater than 0".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Loader overrides
        if let Ok(url) = std::env::var("PARTIALS_BASE_URL") {
            self.loader.base_url = url;
        }
        if let Ok(id) = std::env::var("PARTIALS_ACTIVATION_CONTAINER") {
            // Empty value switches activation off
            self.loader.activation_container = if id.is_empty() { None } else { Some(id) };
        }
        if let Ok(timeout) = std::env::var("PARTIALS_FETCH_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.loader.fetch_timeout_ms = ms;
            }
        }
        if let Ok(var) = std::env::var("PARTIALS_TOKEN_ENV") {
            self.loader.token_env = Some(var);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("PARTIALS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PARTIALS_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

fn first_existing(paths: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|path| path.exists())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Partials Configuration
#
# Environment variables override these settings:
# - PARTIALS_BASE_URL
# - PARTIALS_ACTIVATION_CONTAINER (empty disables script activation)
# - PARTIALS_FETCH_TIMEOUT_MS
# - PARTIALS_TOKEN_ENV
# - PARTIALS_LOG_LEVEL
# - PARTIALS_LOG_FORMAT

[loader]
# Origin serving the fragments; relative URLs are resolved against it
base_url = "http://localhost:5500"

# Container whose <script> elements are re-executed after injection
activation_container = "vendorjs"

# Per-fragment fetch timeout (ms); a timeout counts as a failed fetch
fetch_timeout_ms = 10000

# Buffered loader events per subscriber
event_capacity = 256

# Environment variable holding the bearer token (optional)
# token_env = "PARTIALS_TOKEN"

# Container id -> fragment URL
[loader.fragments]
sidebar = "/partials/sidebar.html"
navbar = "/partials/navbar.html"
vendorjs = "/partials/vendor.html"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
