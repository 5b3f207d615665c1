use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Timeout loading {url}")]
    Timeout { url: String },

    #[error("Request failed for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP status {code} from {url}")]
    HttpStatus { url: String, code: u16 },

    #[error("Page does not look like a fundraiser page (no currency marker)")]
    TemplateMismatch { excerpt: String },

    #[error("Page matched the template but no fields could be extracted")]
    NoFields { excerpt: String },

    #[error("Invalid fundraiser: {0}")]
    InvalidTarget(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// Classify an error that ended a refresh cycle.
    ///
    /// Returns `None` for setup errors (bad target, bad config, local IO)
    /// which never come out of a fetch or an extraction.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            MonitorError::Timeout { .. } => Some(FailureKind::Timeout),
            MonitorError::Network { .. } => Some(FailureKind::Network),
            MonitorError::HttpStatus { .. } => Some(FailureKind::HttpStatus),
            MonitorError::TemplateMismatch { .. } | MonitorError::NoFields { .. } => {
                Some(FailureKind::TemplateMismatch)
            }
            _ => None,
        }
    }

    /// Diagnostic excerpt of the unexpected page content, if any.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            MonitorError::TemplateMismatch { excerpt } | MonitorError::NoFields { excerpt } => {
                Some(excerpt)
            }
            _ => None,
        }
    }
}

/// Why a refresh cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Network,
    HttpStatus,
    TemplateMismatch,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::HttpStatus => "http-status",
            FailureKind::TemplateMismatch => "template-mismatch",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
