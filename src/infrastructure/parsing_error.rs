//! Error types for the extraction engine
//!
//! Fetch and extraction misses are not errors at the engine boundary: they are
//! reported as absent values. These types cover construction failures and the
//! internal causes that the fetcher logs before turning them into `None`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("HTTP client setup failed: {message}")]
    HttpClient { message: String },

    #[error("No valid selector in '{field}' list (tried: {tried})")]
    InvalidSelector { field: String, tried: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String, field: String },
}

impl EngineError {
    pub fn http_client(message: impl Into<String>) -> Self {
        Self::HttpClient {
            message: message.into(),
        }
    }

    pub fn invalid_selector(field: &str, tried: &[String]) -> Self {
        Self::InvalidSelector {
            field: field.to_string(),
            tried: tried.join(", "),
        }
    }

    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.to_string(),
        }
    }
}

/// Why a single page fetch produced no document
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },
}

impl FetchError {
    /// True for failures that a later retry of the same URL may fix
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Body { .. } => true,
            Self::EmptyBody { .. } => false,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
