// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for pagetap
//!
//! The taxonomy mirrors the capture lifecycle: URL validation, browser
//! launch/attach, protocol traffic, navigation, and export. Timeouts are the
//! one recoverable class (`is_timeout`); a capture session downgrades them to
//! a warning and keeps whatever it recorded.

use thiserror::Error;

/// Result type alias for pagetap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pagetap
#[derive(Error, Debug)]
pub enum Error {
    /// Target URL has no resolvable host
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Browser could not be started or attached to
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// DevTools HTTP endpoint failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the browser was closed
    #[error("browser connection closed")]
    ConnectionClosed,

    /// The browser rejected a protocol command
    #[error("protocol error from {method}: {message}")]
    Protocol { method: String, message: String },

    /// Navigation failed for a reason other than a timeout
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    /// Operation exceeded its time budget
    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid-URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Error::Launch(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(method: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Protocol {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a navigation error
    pub fn navigation(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NavigationFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a timeout error
    ///
    /// Timeouts are recoverable: the session logs a warning and proceeds to
    /// an orderly shutdown with partial results.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if this is a protocol-level error
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol { .. } | Error::ConnectionClosed)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_recoverable() {
        let err = Error::timeout("navigation", 60_000);
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "navigation timed out after 60000ms"
        );
    }

    #[test]
    fn test_invalid_url_display() {
        let err = Error::invalid_url("not a url", "host could not be determined");
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_protocol_error() {
        let err = Error::protocol("Network.getResponseBody", "No data found");
        assert!(err.is_protocol());
        assert!(!err.is_timeout());
    }
}
