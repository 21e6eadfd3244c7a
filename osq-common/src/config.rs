//! Bootstrap configuration loading and root folder resolution
//!
//! Priority order for every value:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "OSQ_CONFIG";
/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "OSQ_ROOT_FOLDER";
/// Environment variable carrying the OSM OAuth2 access token
pub const ENV_OSM_TOKEN: &str = "OSQ_OSM_TOKEN";

const DATABASE_FILE_NAME: &str = "osq.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (optional, OS default otherwise)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// OSM API 0.6 base URL
    #[serde(default = "default_osm_api_url")]
    pub osm_api_url: String,

    /// OAuth2 access token for authenticated OSM calls
    #[serde(default)]
    pub osm_access_token: Option<String>,

    /// Photo hosting service base URL
    #[serde(default = "default_photo_service_url")]
    pub photo_service_url: String,

    /// Traffic-flow segment service URL
    #[serde(default = "default_oneway_api_url")]
    pub oneway_api_url: String,

    /// Client identifier appended to uploaded notes and sent as User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            osm_api_url: default_osm_api_url(),
            osm_access_token: None,
            photo_service_url: default_photo_service_url(),
            oneway_api_url: default_oneway_api_url(),
            user_agent: default_user_agent(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Tuning of the note upload run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Half edge length, in degrees, of the box searched for an existing note.
    /// 0 searches exactly at the pending note's position.
    #[serde(default)]
    pub note_search_radius: f64,

    /// Maximum notes returned by the search
    #[serde(default = "default_note_search_limit")]
    pub note_search_limit: u32,

    /// Closed notes older than this many days are not returned by the search
    #[serde(default = "default_hide_closed_after_days")]
    pub hide_closed_after_days: u32,

    /// Timeout for a single HTTP request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for retrying a locked database write
    #[serde(default = "default_db_max_lock_wait_ms")]
    pub db_max_lock_wait_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            note_search_radius: 0.0,
            note_search_limit: default_note_search_limit(),
            hide_closed_after_days: default_hide_closed_after_days(),
            request_timeout_secs: default_request_timeout_secs(),
            db_max_lock_wait_ms: default_db_max_lock_wait_ms(),
        }
    }
}

impl UploadConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

fn default_osm_api_url() -> String {
    "https://api.openstreetmap.org/api/0.6".to_string()
}

fn default_photo_service_url() -> String {
    "https://streetcomplete.westnordost.de/cPhotoUpload".to_string()
}

fn default_oneway_api_url() -> String {
    "https://www.westnordost.de/streetcomplete/oneway-data-api/".to_string()
}

fn default_user_agent() -> String {
    format!("osq {}", env!("CARGO_PKG_VERSION"))
}

fn default_note_search_limit() -> u32 {
    10
}

fn default_hide_closed_after_days() -> u32 {
    7
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_db_max_lock_wait_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a TOML config file, creating the parent directory if needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    // Temp file + rename: readers never observe a partial file
    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Platform default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("osq").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("osq"))
        .unwrap_or_else(|| PathBuf::from("./osq_data"))
}

/// Resolves the effective configuration from CLI, environment, TOML and defaults
#[derive(Debug, Default)]
pub struct ConfigResolver {
    cli_config_path: Option<PathBuf>,
    cli_root_folder: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config_path = path;
        self
    }

    pub fn with_root_folder(mut self, path: Option<PathBuf>) -> Self {
        self.cli_root_folder = path;
        self
    }

    /// Locate the TOML file to load, if any: CLI → ENV → existing OS default
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config_path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(path));
        }
        default_config_path().filter(|p| p.exists())
    }

    /// Resolve the full configuration.
    ///
    /// An explicitly named config file that cannot be read is an error; a
    /// missing default config file is not.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let explicit = self.cli_config_path.is_some() || std::env::var(ENV_CONFIG_PATH).is_ok();

        let mut config = match self.config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            Some(path) if explicit => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            _ => {
                warn!("No configuration file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        if let Ok(token) = std::env::var(ENV_OSM_TOKEN) {
            if !token.trim().is_empty() {
                config.osm_access_token = Some(token);
            }
        }

        config.root_folder = Some(self.resolve_root_folder(&config));
        Ok(config)
    }

    /// Root folder: CLI → ENV → TOML → OS default
    pub fn resolve_root_folder(&self, config: &TomlConfig) -> PathBuf {
        if let Some(path) = &self.cli_root_folder {
            return path.clone();
        }
        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            return PathBuf::from(path);
        }
        if let Some(path) = &config.root_folder {
            return path.clone();
        }
        default_root_folder()
    }
}

/// Database file location inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}
