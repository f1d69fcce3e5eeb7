//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Ledger access settings
    pub ledger: LedgerSettings,
    /// Reconciliation settings
    pub sync: SyncSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            ledger: LedgerSettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl AppConfig {
    /// Path of the SQLite database inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("questboard.db")
    }
}

/// Ledger access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Base URL of the ledger RPC gateway
    pub rpc_url: String,
    /// Asset whose balances back on-chain XP
    pub asset_id: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.questboard.io".to_string(),
            asset_id: "XPT".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl LedgerSettings {
    /// Per-request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs as u64)
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Concurrent ledger reads per batch
    pub batch_size: usize,
    /// Delay between batches in milliseconds
    pub batch_delay_ms: u64,
    /// Seconds between periodic reconciliation runs
    pub interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay_ms: 100,
            interval_secs: 300,
        }
    }
}

impl SyncSettings {
    /// Inter-batch delay as a duration.
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Run interval as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "questboard", "Questboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from file.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = get_config_path();

    if !path.exists() {
        let config = AppConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(config);
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = get_data_dir();

    Ok(config)
}

/// Save application configuration to file.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = get_config_path();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
