//! Request/response descriptors exchanged with the transport

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::verb::HttpVerb;

/// A single stored record as returned to callers
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Fully resolved HTTP request
///
/// Produced by the request builder; the transport sends it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP verb
    pub verb: HttpVerb,

    /// Absolute URL including the query string
    pub url: String,

    /// JSON payload for mutations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Create a request without a body
    pub fn new(verb: HttpVerb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            body: None,
        }
    }

    /// Attach a JSON payload
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP response as seen by the adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body as JSON value
    /// Will be null if body was empty or not valid JSON
    pub body: serde_json::Value,

    /// Raw body as string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

impl HttpResponse {
    /// Create a JSON response with the given status
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        let body_text = body.to_string();
        Self {
            status,
            headers: HashMap::new(),
            body,
            body_text: Some(body_text),
        }
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Check for 404 Not Found
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}
