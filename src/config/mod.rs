//! Configuration management for compline
//!
//! Settings come from, highest precedence first:
//! 1. Command-line arguments (`-v`, `-q`, `--config`)
//! 2. The `COMPLINE_LOG` environment variable (log filter only)
//! 3. The configuration file (TOML)
//! 4. Default values
//!
//! A missing configuration file is not an error; every field has a default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::driver::SpecSettings;
use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External resolver limits
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Spec file lookup
    #[serde(default)]
    pub spec: SpecConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Limits applied to resolvers that leave the process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Timeout for external commands in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long command output is reused within one process, in seconds
    /// (0, the default, disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum state hops and grammar delegations per request
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,
}

/// Where spec files are looked up by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Directory holding `<name>.toml` spec files
    #[serde(default = "default_spec_directory")]
    pub directory: PathBuf,
}

// Default value functions
fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_cache_ttl_secs() -> u64 {
    0
}

fn default_max_delegation_depth() -> usize {
    crate::dispatch::MAX_DELEGATION_DEPTH
}

fn default_spec_directory() -> PathBuf {
    config_dir().join("specs")
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("compline")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_delegation_depth: default_max_delegation_depth(),
        }
    }
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            directory: default_spec_directory(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded and validated configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration file at `path`, or the default location
    ///
    /// A missing default file yields the default configuration. An
    /// explicitly requested file must exist.
    ///
    /// # Arguments
    /// * `path` - Explicit configuration file, if any
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.resolver.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver.timeout_ms".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.resolver.max_delegation_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver.max_delegation_depth".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Generic(e.to_string()).into())
    }

    /// Get the external command timeout as Duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver.timeout_ms)
    }

    /// Get the resolver cache lifetime as Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.resolver.cache_ttl_secs)
    }

    /// Defaults for states loaded from spec files
    pub fn spec_settings(&self) -> SpecSettings {
        SpecSettings {
            command_timeout: self.command_timeout(),
            cache_ttl: self.cache_ttl(),
        }
    }

    /// Resolve a `--spec` argument to a file path
    ///
    /// Existing paths are used as given. Anything else is looked up as
    /// `<name>.toml` in the spec directory.
    pub fn resolve_spec_path(&self, spec: &str) -> PathBuf {
        let direct = PathBuf::from(spec);
        if direct.exists() || spec.contains('/') {
            return direct;
        }

        let file = if spec.ends_with(".toml") {
            spec.to_string()
        } else {
            format!("{spec}.toml")
        };
        self.spec.directory.join(file)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }

    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Raise the level by `steps`, saturating at `Trace`
    pub fn raised(self, steps: u8) -> Self {
        const ORDER: [LogLevel; 5] = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let current = ORDER.iter().position(|l| *l == self).unwrap_or(1);
        ORDER[(current + steps as usize).min(ORDER.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComplineError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(!config.logging.timestamps);
        assert_eq!(config.resolver.timeout_ms, 500);
        assert_eq!(config.resolver.cache_ttl_secs, 0);
        assert_eq!(config.resolver.max_delegation_depth, 8);
        assert!(config.spec.directory.ends_with("compline/specs"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml_str("[resolver]\ntimeout_ms = 250\n").unwrap();
        assert_eq!(config.command_timeout(), Duration::from_millis(250));
        assert!(config.cache_ttl().is_zero());
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_validation() {
        let err = Config::from_toml_str("[resolver]\ntimeout_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ComplineError::Config(ConfigError::InvalidValue { ref field, .. })
                if field == "resolver.timeout_ms"
        ));

        let err = Config::from_toml_str("[resolver]\nmax_delegation_depth = 0\n").unwrap_err();
        assert!(matches!(err, ComplineError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_format() {
        let err = Config::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ComplineError::Config(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ComplineError::Config(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.logging.level = LogLevel::Debug;
        config.resolver.cache_ttl_secs = 15;
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_spec_settings() {
        let config =
            Config::from_toml_str("[resolver]\ntimeout_ms = 100\ncache_ttl_secs = 45\n")
                .unwrap();
        let settings = config.spec_settings();
        assert_eq!(settings.command_timeout, Duration::from_millis(100));
        assert_eq!(settings.cache_ttl, Duration::from_secs(45));
    }

    #[test]
    fn test_resolve_spec_path() {
        let mut config = Config::default();
        config.spec.directory = PathBuf::from("/specs");
        assert_eq!(config.resolve_spec_path("pkg"), PathBuf::from("/specs/pkg.toml"));
        assert_eq!(config.resolve_spec_path("pkg.toml"), PathBuf::from("/specs/pkg.toml"));
        assert_eq!(config.resolve_spec_path("./x/pkg.toml"), PathBuf::from("./x/pkg.toml"));
    }

    #[test]
    fn test_log_level_raised() {
        assert_eq!(LogLevel::Warn.raised(1), LogLevel::Info);
        assert_eq!(LogLevel::Warn.raised(2), LogLevel::Debug);
        assert_eq!(LogLevel::Info.raised(9), LogLevel::Trace);
        assert_eq!(LogLevel::Error.as_directive(), "error");
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }
}
