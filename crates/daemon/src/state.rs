use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use common::prelude::Ownership;

pub const APP_NAME: &str = "ferry";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATA_DIR_NAME: &str = "data";

/// Port the service has always listened on.
pub const DEFAULT_PORT: u16 = 9999;

/// Maximum upload size in bytes (500 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP(S) server
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Storage root. Relative paths are taken from the working directory at
    /// startup; unset means `<working directory>/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Largest accepted request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Serve HTTPS with this certificate and key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
    /// Change ownership of uploaded files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Ownership>,
}

/// PEM-encoded certificate chain and private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

fn default_listen_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            data_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
            tls: None,
            ownership: None,
        }
    }
}

impl AppConfig {
    /// Resolve the storage root against the current working directory. Called once
    /// at startup; the result is handed to every component.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, StateError> {
        let cwd = std::env::current_dir().map_err(StateError::NoWorkingDirectory)?;
        Ok(match &self.data_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.join(DATA_DIR_NAME),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the ferry directory (~/.ferry)
    pub ferry_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the ferry directory path (custom or default ~/.ferry)
    pub fn ferry_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new ferry state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let ferry_dir = Self::ferry_dir(custom_path)?;

        if ferry_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&ferry_dir)?;

        let config = config.unwrap_or_default();
        let config_path = ferry_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            ferry_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the ferry directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let ferry_dir = Self::ferry_dir(custom_path)?;

        if !ferry_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = ferry_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            ferry_dir,
            config_path,
            config,
        })
    }

    /// Like [`AppState::load`], but an uninitialized directory yields the default
    /// configuration instead of an error.
    pub fn load_or_default(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        match Self::load(custom_path.clone()) {
            Err(StateError::NotInitialized) => {
                let ferry_dir = Self::ferry_dir(custom_path)?;
                tracing::debug!(dir = %ferry_dir.display(), "no config directory, using defaults");
                Ok(Self {
                    config_path: ferry_dir.join(CONFIG_FILE_NAME),
                    ferry_dir,
                    config: AppConfig::default(),
                })
            }
            other => other,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("ferry directory not initialized. Run 'ferry init' first")]
    NotInitialized,

    #[error("ferry directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("cannot determine working directory: {0}")]
    NoWorkingDirectory(#[source] std::io::Error),

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
