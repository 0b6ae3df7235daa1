//! Logging system configuration and initialization
//!
//! - Console output (stderr) with local timestamps
//! - Optional file output with daily rotation (non-blocking writer)
//! - Optional structured JSON format
//! - `RUST_LOG` overrides the configured level and module filters

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Local;
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::defaults;

// Global guard to keep the log file writer alive
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(Vec::new());
}

const LOG_FILE_PREFIX: &str = "deal-tracker.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Timestamps in the machine's local timezone
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory for rolling log files, under the platform data dir
pub fn get_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(defaults::APP_DIR_NAME))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("logs")
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Filter directives derived from the configuration: the base level, our own
/// crate at that level, then per-module overrides. Below `trace`, noisy
/// dependencies are capped by `module_filters`.
fn filter_directives(config: &LoggingConfig) -> Vec<String> {
    let mut directives = vec![
        config.level.clone(),
        format!("{}={}", env!("CARGO_CRATE_NAME"), config.level),
    ];

    if !config.level.eq_ignore_ascii_case("trace") {
        let mut modules: Vec<_> = config.module_filters.iter().collect();
        modules.sort();
        directives.extend(modules.into_iter().map(|(module, level)| format!("{}={}", module, level)));
    }

    directives
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        filter_directives(config)
            .iter()
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::new(defaults::LOG_LEVEL), EnvFilter::add_directive)
    })
}

/// Initialize logging with custom configuration
///
/// ```bash
/// # Show HTTP client details
/// RUST_LOG="debug,reqwest=debug,hyper=debug" deal-tracker refresh
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let log_dir = get_log_directory();

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let file_appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (file_writer, file_guard) = non_blocking(file_appender);

        // Store the guard globally to prevent it from being dropped
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(file_guard);
        }

        let file_layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
    }

    if config.console_output {
        let console_layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .boxed()
        };
        layers.push(console_layer);
    }

    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    Registry::default()
        .with(layers)
        .with(build_env_filter(&config))
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.console_output);
        assert!(!config.json_format);
        assert_eq!(config.module_filters.get("sqlx").map(String::as_str), Some("warn"));
    }

    #[test]
    fn directives_include_crate_and_module_filters() {
        let directives = filter_directives(&LoggingConfig::default());
        assert_eq!(directives[0], "info");
        assert!(directives.contains(&"deal_tracker=info".to_string()));
        assert!(directives.contains(&"hyper=warn".to_string()));
        assert!(directives.contains(&"reqwest=info".to_string()));
    }

    #[test]
    fn trace_level_keeps_dependency_logs() {
        let config = LoggingConfig {
            level: "trace".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directives(&config), vec!["trace", "deal_tracker=trace"]);
    }

    #[test]
    fn no_output_is_rejected() {
        let config = LoggingConfig {
            console_output: false,
            file_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(config).is_err());
    }

    #[test]
    fn log_directory_is_named_logs() {
        assert!(get_log_directory().ends_with("logs"));
    }
}
