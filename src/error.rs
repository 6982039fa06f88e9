// src/error.rs

//! Unified error handling for the alert job.

use std::fmt;

use thiserror::Error;

/// Result type alias for alert job operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required settings are absent
    #[error("The following required environment variables are missing: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    /// A listing page could not be fetched
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// The email transport rejected or failed a send
    #[error("Notification error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error with the offending URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }
}
