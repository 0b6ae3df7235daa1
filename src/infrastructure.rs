//! Infrastructure layer for HTTP fetching, parsing, storage and configuration
//!
//! This module provides the page fetcher, field extraction, SQLite and
//! in-memory record stores, configuration files and logging setup.

pub mod config; // Configuration structures, defaults and file manager
pub mod database_connection;
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod parsing;
pub mod parsing_error; // Engine error types
pub mod record_repository;

// Re-export commonly used items
pub use config::{AppConfig, BatchConfig, ConfigManager, LoggingConfig, RefreshConfig};
pub use database_connection::DatabaseConnection;
pub use http_client::{Document, FetchOutcome, HttpClientConfig, HttpPageFetcher, PageFetcher};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{parse_price, ExtractionOutcome, FieldExtractor, SelectorConfig};
pub use parsing_error::{EngineError, EngineResult, FetchError};
pub use record_repository::{MemoryRecordStore, SqliteRecordStore};
