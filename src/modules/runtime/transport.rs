//! HTTP transport
//!
//! The adapter hands a fully resolved [`HttpRequest`] to a [`Transport`] and
//! gets an [`HttpResponse`] back. Status classification happens in the
//! adapter, so a transport only fails when no response was received.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Method};
use restbridge_core::{BasicAuth, ConnectionConfig, RestError};
use restbridge_types::{HttpRequest, HttpResponse, HttpVerb};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for sending HTTP requests
///
/// Implementations can use real HTTP clients or canned responses for testing.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return whatever response the server produced
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError>;

    /// Get the transport type name
    fn transport_type(&self) -> &'static str;
}

/// Production transport using reqwest
pub struct ReqwestTransport {
    client: Client,
    basic_auth: Option<BasicAuth>,
}

impl ReqwestTransport {
    /// Create a transport for a connection: default headers, credentials,
    /// certificate policy and timeout come from the connection config
    pub fn new(config: &ConnectionConfig) -> Result<Self, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| RestError::Config(format!("Invalid header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                RestError::Config(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .danger_accept_invalid_certs(!config.reject_unauthorized)
            .build()
            .map_err(|e| RestError::Config(format!("HTTP client creation failed: {}", e)))?;

        Ok(Self {
            client,
            basic_auth: config.basic_auth.clone(),
        })
    }
}

fn to_method(verb: HttpVerb) -> Method {
    match verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Post => Method::POST,
        HttpVerb::Put => Method::PUT,
        HttpVerb::Patch => Method::PATCH,
        HttpVerb::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, RestError> {
        debug!("{} {}", request.verb.as_wire(), request.url);

        let mut builder = self.client.request(to_method(request.verb), &request.url);

        if let Some(auth) = &self.basic_auth {
            builder = builder.basic_auth(&auth.username, auth.password.as_ref());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RestError::network(e.to_string()))?;

        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| RestError::network(e.to_string()))?;

        // Empty or non-JSON bodies are surfaced as null
        let body = serde_json::from_str(&body_text).unwrap_or(serde_json::Value::Null);

        Ok(HttpResponse {
            status,
            headers,
            body,
            body_text: Some(body_text),
        })
    }

    fn transport_type(&self) -> &'static str {
        "reqwest"
    }
}
