//! Bootstrap configuration
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (both handled by clap in the binary, see [`ConfigOverrides`])
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing default config file is not an error: the service starts on
//! compiled defaults. A config file named explicitly must exist and parse.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Directory name used under the platform config directory
const CONFIG_DIR_NAME: &str = "phone-address-service";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Key-value store connection configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite file backing the store (created if missing)
    pub database_path: PathBuf,

    /// Upper bound on pooled connections
    pub max_connections: u32,

    /// Time allowed to establish or acquire a connection
    pub connect_timeout_secs: u64,

    /// Time allowed for a single store operation
    pub operation_timeout_secs: u64,
}

impl StoreConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("phone_address.db"),
            max_connections: 10,
            connect_timeout_secs: 5,
            operation_timeout_secs: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable lines
    Text,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(Error::Config(format!(
                "Unknown log format '{}' (expected 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Values supplied on the command line or through environment variables
///
/// `None` means "not given": the TOML value (or default) is kept.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from a file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve the configuration file and load it
    ///
    /// An explicit path must load successfully. Without one, the platform
    /// default location is tried and compiled defaults are used when it is
    /// absent or unreadable. Runs before logging is set up, so the returned
    /// [`ConfigSource`] is logged by the caller once tracing is initialized.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        Self::resolve_with_default(explicit, default_config_path())
    }

    /// [`TomlConfig::resolve`] with the default location supplied by the caller
    pub fn resolve_with_default(
        explicit: Option<&Path>,
        default_path: Option<PathBuf>,
    ) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        match default_path {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => Ok((config, ConfigSource::File(path))),
                Err(e) => Ok((
                    Self::default(),
                    ConfigSource::Ignored {
                        path,
                        reason: e.to_string(),
                    },
                )),
            },
            _ => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    /// Apply command-line / environment overrides on top of file values
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(path) = overrides.database_path {
            self.store.database_path = path;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
        self
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.store.max_connections == 0 {
            return Err(Error::Config(
                "store.max_connections must be at least 1".to_string(),
            ));
        }
        if self.store.connect_timeout_secs == 0 || self.store.operation_timeout_secs == 0 {
            return Err(Error::Config(
                "store timeouts must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Address for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Where the resolved configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No config file; compiled defaults only
    Defaults,
    /// Default-location file was present but unusable; compiled defaults used
    Ignored { path: PathBuf, reason: String },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
            ConfigSource::Ignored { path, reason } => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }
}

/// Platform default config file: `<config dir>/phone-address-service/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
}
