//! Configuration loading and root folder resolution
//!
//! The resolved [`VaultConfig`] is built once at startup and handed to the
//! store and router; nothing reads the environment after that.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{Error, Result};

/// Explicit root folder override
pub const ROOT_ENV_VAR: &str = "WATCHME_VAULT_ROOT";
/// `1` selects the local development root folder
pub const LOCAL_DEV_ENV_VAR: &str = "WATCHME_LOCAL_DEV";
/// Path to the TOML configuration file
pub const CONFIG_ENV_VAR: &str = "WATCHME_VAULT_CONFIG";

pub const DEFAULT_ROOT_FOLDER: &str = "/home/ubuntu/data/data_accounts";
pub const LOCAL_DEV_ROOT_FOLDER: &str = "data/data_accounts";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; missing values fall through to defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub bind_addr: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Maximum accepted request body for uploads
    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from an explicit path, or from the default location if present
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                warn!(
                    "Config file not found at {}, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

/// `~/.config/watchme-vault/config.toml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("watchme-vault").join("config.toml"))
}

/// Values supplied on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub root_folder: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub logging: LoggingConfig,
}

impl VaultConfig {
    /// Resolve configuration: overrides, then environment, then TOML, then defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let toml = TomlConfig::load_or_default(overrides.config_path.as_deref())?;
        let root_folder = resolve_root_folder(overrides.root_folder.as_deref(), &toml);

        Ok(Self {
            root_folder,
            bind_addr: overrides
                .bind_addr
                .or(toml.bind_addr)
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            logging: toml.logging,
        })
    }

    /// Configuration for a given root with every other value defaulted
    pub fn with_root(root_folder: impl Into<PathBuf>) -> Self {
        Self {
            root_folder: root_folder.into(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            logging: LoggingConfig::default(),
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. `WATCHME_VAULT_ROOT`
/// 3. `WATCHME_LOCAL_DEV=1` selects [`LOCAL_DEV_ROOT_FOLDER`]
/// 4. TOML `root_folder`
/// 5. [`DEFAULT_ROOT_FOLDER`]
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        info!("Root folder from command line: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            info!("Root folder from {}: {}", ROOT_ENV_VAR, path);
            return PathBuf::from(path);
        }
    }

    if std::env::var(LOCAL_DEV_ENV_VAR).as_deref() == Ok("1") {
        info!("Local development mode, root folder: {}", LOCAL_DEV_ROOT_FOLDER);
        return PathBuf::from(LOCAL_DEV_ROOT_FOLDER);
    }

    if let Some(path) = &toml.root_folder {
        info!("Root folder from config file: {}", path.display());
        return path.clone();
    }

    PathBuf::from(DEFAULT_ROOT_FOLDER)
}
