//! Deal Tracker - price tracking for e-commerce product pages
//!
//! Fetches product pages under bounded parallelism, extracts title and price,
//! and shifts price history on repeat runs so callers can spot discounts.

// Module declarations
pub mod application;
pub mod commands;
pub mod crawling;
pub mod domain;
pub mod infrastructure;

pub use application::{LogNotifier, Notifier, RefreshReport, RefreshService, TrackError};
pub use crawling::{BatchRunner, ExtractionOrchestrator, Jitter};
pub use domain::{BatchReport, ProductRecord, RecordStore};
pub use infrastructure::{AppConfig, FieldExtractor, HttpClientConfig, HttpPageFetcher, PageFetcher};
