//! Application layer module
//!
//! Use cases that drive the extraction engine on behalf of a caller:
//! refresh policy, product tracking and sale notifications.

pub mod notifier;
pub mod refresh_service;

pub use notifier::{LogNotifier, Notifier};
pub use refresh_service::{RefreshReport, RefreshService, TrackError};
