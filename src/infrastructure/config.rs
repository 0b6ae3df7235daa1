//! Configuration infrastructure
//!
//! Contains configuration loading and management for the deal tracker.
//!
//! Configuration is organized into:
//! 1. Engine settings (HTTP identity, batch size, selectors)
//! 2. Caller policy (refresh retry ceiling and backoff)
//! 3. Ambient settings (logging, database location)

#![allow(clippy::uninlined_format_args)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::parsing::SelectorConfig;
use crate::infrastructure::parsing_error::{EngineError, EngineResult};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Page fetcher identity and timeout
    pub http: HttpClientConfig,

    /// Worker pool sizing for fetch and parse phases
    pub batch: BatchConfig,

    /// Product page selectors
    pub selectors: SelectorConfig,

    /// Retry policy for background refreshes
    pub refresh: RefreshConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// sqlx connection string for the record store
    pub database_url: String,
}

/// Batch runner sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Concurrent fetch tasks and parse threads per batch
    pub max_workers: usize,
}

/// Refresh retry policy. Attempt `n` (0-based) runs with `base_delay_ms * n`
/// of launch jitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub base_delay_ms: u64,
    pub max_attempts: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output (daily rolling)
    pub file_output: bool,

    /// Module-specific log level filters (e.g., "sqlx": "warn", "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpClientConfig::default(),
            batch: BatchConfig::default(),
            selectors: SelectorConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
            database_url: defaults::DATABASE_URL.to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: defaults::MAX_WORKERS,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: defaults::REFRESH_BASE_DELAY_MS,
            max_attempts: defaults::REFRESH_MAX_ATTEMPTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let module_filters = defaults::LOG_MODULE_FILTERS
            .iter()
            .map(|(module, level)| ((*module).to_string(), (*level).to_string()))
            .collect();

        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            module_filters,
        }
    }
}

impl AppConfig {
    /// Check settings that would otherwise stall or disable the engine
    pub fn validate(&self) -> EngineResult<()> {
        if self.batch.max_workers == 0 {
            return Err(EngineError::configuration(
                "batch.max_workers",
                "worker pool needs at least one worker",
            ));
        }
        if self.http.timeout_seconds == 0 {
            return Err(EngineError::configuration(
                "http.timeout_seconds",
                "request timeout must be positive",
            ));
        }
        if self.refresh.max_attempts == 0 {
            return Err(EngineError::configuration(
                "refresh.max_attempts",
                "refresh needs at least one attempt",
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(EngineError::configuration("database_url", "database url is empty"));
        }
        Ok(())
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Get application data directory (database, logs)
    pub fn get_app_data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .context("Failed to get user data directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(data_dir)
    }

    /// Create a configuration manager for the per-user config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file is unreadable: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;

                info!("✅ Reset to default configuration");
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }
}

/// Default values for configuration
pub mod defaults {
    /// Directory name under the platform config and data dirs
    pub const APP_DIR_NAME: &str = "deal-tracker";

    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Browser identity sent with every page request
    pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/42.0.2311.90 Safari/537.36";

    pub const REFERRER: &str = "https://www.google.com";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default worker pool size per batch
    pub const MAX_WORKERS: usize = 8;

    /// Jitter ceiling step between refresh attempts, in milliseconds
    pub const REFRESH_BASE_DELAY_MS: u64 = 500;

    /// Update batches run by one refresh before giving up
    pub const REFRESH_MAX_ATTEMPTS: u32 = 3;

    /// Default record store location
    pub const DATABASE_URL: &str = "sqlite://deal_tracker.db";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;

    /// Noisy dependencies kept quiet unless RUST_LOG says otherwise
    pub const LOG_MODULE_FILTERS: &[(&str, &str)] = &[
        ("reqwest", "info"),
        ("hyper", "warn"),
        ("sqlx", "warn"),
        ("html5ever", "warn"),
        ("selectors", "warn"),
    ];
}
