//! Per-call request and response contexts shared with hooks

use restbridge_core::{id_segment, ConnectionConfig, RestError};
use restbridge_types::{CrudMethod, HttpRequest, HttpVerb};
use serde_json::{Map, Value};
use url::Url;

/// Mutable state of one outgoing call
///
/// Built by the request builder, then handed to every before hook in order.
/// The built-in hooks fill `query`, `body` and `endpoint`; custom hooks may
/// rewrite any field.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Connection identity
    pub identity: String,

    /// Collection name as passed by the caller
    pub collection: String,

    pub method: CrudMethod,

    pub verb: HttpVerb,

    /// Call-scoped copy of the connection config with overrides applied
    pub config: ConnectionConfig,

    /// Scheme, host and port of the API server
    pub base_url: Url,

    /// Resource pathname, without the id segment
    pub pathname: String,

    /// Single-resource id taken from `where.id`
    pub id: Option<Value>,

    /// Remaining `where` conditions
    pub where_clause: Map<String, Value>,

    /// Remaining options: pagination and extra options that were not config overrides
    pub options: Map<String, Value>,

    /// Values passed to create/update
    pub values: Option<Value>,

    /// Query string parameters
    pub query: Map<String, Value>,

    /// JSON payload
    pub body: Option<Value>,

    /// Final URL, set by the endpoint hook
    pub endpoint: Option<Url>,
}

impl RequestContext {
    /// Absolute resource URL, with the id appended as one percent-encoded
    /// path segment
    pub fn resource_url(&self) -> Result<Url, RestError> {
        let mut url = self.base_url.join(&self.pathname)?;
        if let Some(id) = &self.id {
            url.path_segments_mut()
                .map_err(|_| RestError::Internal(format!("{} cannot carry a path", self.base_url)))?
                .pop_if_empty()
                .push(&id_segment(id));
        }
        Ok(url)
    }

    /// Turn the context into the request handed to the transport
    pub fn to_request(&self) -> Result<HttpRequest, RestError> {
        let endpoint = self.endpoint.as_ref().ok_or_else(|| {
            RestError::Hook(format!(
                "no endpoint resolved for {} {}",
                self.method, self.collection
            ))
        })?;

        let request = HttpRequest::new(self.verb, endpoint.as_str());
        match (&self.body, self.verb.is_read()) {
            (Some(body), false) => Ok(request.with_body(body.clone())),
            _ => Ok(request),
        }
    }
}

/// State of one received response, handed to every after hook in order
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub identity: String,

    pub collection: String,

    pub method: CrudMethod,

    /// URL the request was sent to
    pub url: String,

    pub status: u16,

    /// Decoded JSON body (null when empty or not JSON)
    pub body: Value,
}

impl ResponseContext {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
