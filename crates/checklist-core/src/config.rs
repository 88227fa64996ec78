//! Configuration for the checklist service
//!
//! The port and the data file location are part of the contract with the
//! widget and the editor, so both have fixed defaults. A TOML file can move
//! them (e.g. to avoid a port collision), but the bind host is always the
//! loopback interface.
//!
//! ```toml
//! port = 17432
//! data_file = "/Users/me/.tab-checklist-data.json"
//! max_body_bytes = 1048576
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed loopback port shared with the editor page
pub const DEFAULT_PORT: u16 = 17432;

/// Document file name, placed in the user's home directory
pub const DATA_FILE_NAME: &str = ".tab-checklist-data.json";

/// Environment variable overriding the document path
pub const DATA_FILE_ENV: &str = "TAB_CHECKLIST_DATA_FILE";

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Loopback port to listen on
    pub port: u16,
    /// Explicit document path; `None` means `~/.tab-checklist-data.json`
    pub data_file: Option<PathBuf>,
    /// Largest accepted write payload
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_file: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Default config file location (`<config dir>/tab-checklist/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tab-checklist").join("config.toml"))
    }

    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// A missing file is not an error and yields the defaults. Use
    /// [`ServerConfig::load_existing`] for a path the user named explicitly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_inner(path.as_ref(), true)
    }

    /// Like [`ServerConfig::load`], but a missing file is an error
    pub fn load_existing(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_inner(path.as_ref(), false)
    }

    fn load_inner(path: &Path, missing_ok: bool) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if missing_ok && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", path);
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(DATA_FILE_ENV).filter(|s| !s.trim().is_empty()) {
            self.data_file = Some(PathBuf::from(path));
        }
    }

    /// Address to bind. Always loopback.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
    }

    /// Resolve the document path
    pub fn data_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(DATA_FILE_NAME))
                .ok_or(ConfigError::NoHomeDir),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid(
                "port must be fixed, not 0".to_string(),
            ));
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
