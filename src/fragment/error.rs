//! Fragment load error types
//!
//! Every variant is non-fatal and scoped to a single container: the loader
//! records it, logs it and moves on with the rest of the batch.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading one fragment into one container
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
    /// Request was rejected or answered with a non-success status
    #[error("{}", network_message(.status, .message))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// No response within the configured fetch timeout
    #[error("Fetch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Target container is not present in the document
    #[error("Container not found: {container_id}")]
    MissingContainer { container_id: String },

    /// Response body could not be read as text
    #[error("Failed to decode response body: {message}")]
    Decode { message: String },

    /// Fragment URL could not be resolved against the base URL
    #[error("Invalid fragment URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

fn network_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {}: {}", code, message),
        None => format!("Request failed: {}", message),
    }
}

impl LoadError {
    /// Convenience constructor for a missing container
    pub fn missing_container(container_id: impl Into<String>) -> Self {
        LoadError::MissingContainer {
            container_id: container_id.into(),
        }
    }

    /// Short machine-readable label, used as a tracing field
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Network { .. } => "network",
            LoadError::Timeout { .. } => "timeout",
            LoadError::MissingContainer { .. } => "missing_container",
            LoadError::Decode { .. } => "decode",
            LoadError::InvalidUrl { .. } => "invalid_url",
        }
    }

    /// Status code carried by a failed HTTP response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LoadError::Network { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            LoadError::Decode {
                message: err.to_string(),
            }
        } else {
            LoadError::Network {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for fragment operations
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoadError::Network {
            status: Some(404),
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Not Found");

        let err = LoadError::Network {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed: connection refused");

        let err = LoadError::missing_container("sidebar");
        assert_eq!(err.to_string(), "Container not found: sidebar");

        let err = LoadError::Timeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "Fetch timed out after 250ms");
    }

    #[test]
    fn test_kind_and_status() {
        let err = LoadError::Network {
            status: Some(503),
            message: String::new(),
        };
        assert_eq!(err.kind(), "network");
        assert_eq!(err.status(), Some(503));

        let err = LoadError::Decode {
            message: "bad utf-8".into(),
        };
        assert_eq!(err.kind(), "decode");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(LoadError::Timeout { timeout_ms: 5 }).unwrap();
        assert_eq!(json["kind"], "timeout");
        assert_eq!(json["timeout_ms"], 5);
    }
}
