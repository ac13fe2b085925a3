//! Error types for Restbridge

use thiserror::Error;

/// Main error type for Restbridge operations
#[derive(Error, Debug)]
pub enum RestError {
    /// Connection registered without an identity
    #[error("Connection is missing an identity")]
    MissingIdentity,

    /// Connection identity registered twice
    #[error("Connection is already registered: {0}")]
    DuplicateIdentity(String),

    /// Operation against an identity that was never registered
    #[error("Connection not registered: {0}")]
    UnknownIdentity(String),

    /// Configured HTTP verb is not something the transport can issue
    #[error("Invalid REST method: {0}")]
    InvalidMethod(String),

    /// Network failure or 4xx/5xx response
    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// Resource not found (404 outside of `find`)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A before/after hook failed
    #[error("Hook error: {0}")]
    Hook(String),

    /// Cache backend failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration file parsing error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL could not be formatted or parsed
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Transport error ({}): {}", code, message),
        None => format!("Transport error: {}", message),
    }
}

impl RestError {
    /// Build a transport error for a response with a failing status
    pub fn status(status: u16, message: impl Into<String>, body: serde_json::Value) -> Self {
        RestError::Transport {
            status: Some(status),
            message: message.into(),
            body: (!body.is_null()).then_some(body),
        }
    }

    /// Build a transport error for a request that never produced a response
    pub fn network(message: impl Into<String>) -> Self {
        RestError::Transport {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Returns true if this error should be logged at error level
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RestError::Transport { status: None, .. }
                | RestError::Cache(_)
                | RestError::Internal(_)
        ) || self.upstream_status().map_or(false, |s| s >= 500)
    }

    /// Returns true if this error was caused by the caller (bad input or configuration)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RestError::MissingIdentity
                | RestError::DuplicateIdentity(_)
                | RestError::UnknownIdentity(_)
                | RestError::InvalidMethod(_)
                | RestError::Validation(_)
                | RestError::NotFound(_)
        )
    }

    /// Returns true for not-found conditions, local or remote
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::NotFound(_) | RestError::UnknownIdentity(_))
            || self.upstream_status() == Some(404)
    }

    /// Status code reported by the remote API, if any
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            RestError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the HTTP status code that best describes this error
    pub fn status_code(&self) -> u16 {
        match self {
            RestError::NotFound(_) | RestError::UnknownIdentity(_) => 404,
            RestError::DuplicateIdentity(_) => 409,
            RestError::MissingIdentity
            | RestError::InvalidMethod(_)
            | RestError::Validation(_) => 400,
            RestError::Transport {
                status: Some(code), ..
            } => *code,
            RestError::Transport { status: None, .. } => 502,
            _ => 500,
        }
    }
}

/// Result type alias using RestError
pub type Result<T> = std::result::Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(RestError::NotFound("/users/1".into()).status_code(), 404);
        assert_eq!(RestError::DuplicateIdentity("api".into()).status_code(), 409);
        assert_eq!(RestError::InvalidMethod("head".into()).status_code(), 400);
        assert_eq!(RestError::status(503, "Service Unavailable", json!(null)).status_code(), 503);
        assert_eq!(RestError::network("connection refused").status_code(), 502);
    }

    #[test]
    fn test_transport_message() {
        let err = RestError::status(500, "Internal Server Error", json!({"error": "boom"}));
        assert_eq!(err.to_string(), "Transport error (500): Internal Server Error");

        let err = RestError::network("connection refused");
        assert_eq!(err.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_error_classification() {
        assert!(RestError::MissingIdentity.is_client_error());
        assert!(RestError::UnknownIdentity("x".into()).is_not_found());
        assert!(RestError::status(404, "Not Found", json!(null)).is_not_found());
        assert!(RestError::status(502, "Bad Gateway", json!(null)).is_error());
        assert!(!RestError::status(400, "Bad Request", json!(null)).is_error());
        assert!(!RestError::Hook("nope".into()).is_client_error());
    }
}
