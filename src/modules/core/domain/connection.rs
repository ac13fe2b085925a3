//! REST connection configuration

use restbridge_types::{pluralize, CrudMethod, HttpVerb};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use url::Url;

use crate::error::{RestError, Result};
use crate::merge::{deep_merge, override_existing};

/// Configuration of one registered REST connection
///
/// Field names follow the connection config keys callers write in JSON or
/// YAML (`basicAuth`, `rejectUnauthorized`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Unique name for this connection
    #[serde(default)]
    pub identity: String,

    /// Expected response type (only `json` is supported)
    #[serde(rename = "type", default = "default_response_type")]
    pub response_type: String,

    /// `http` or `https`
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Host with optional port (`api.example.com:8080`), wins over `hostname`/`port`
    #[serde(default)]
    pub host: Option<String>,

    /// Host name without port
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Port used together with `hostname`
    #[serde(default)]
    pub port: Option<u16>,

    /// Base API path (`/api/v1`)
    #[serde(default)]
    pub pathname: String,

    /// Resource name, defaults to the pluralized collection name
    #[serde(default)]
    pub resource: Option<String>,

    /// Fixed action segment appended after the resource
    #[serde(default)]
    pub action: Option<String>,

    /// Query parameters sent with every request
    #[serde(default)]
    pub query: Map<String, Value>,

    /// CRUD method to HTTP verb mapping
    #[serde(default)]
    pub methods: MethodMap,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Credentials passed through to the transport
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,

    /// Reject invalid TLS certificates (default: true)
    #[serde(default = "default_true")]
    pub reject_unauthorized: bool,

    /// Transport timeout in seconds (default: 30)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Hook pipeline settings
    #[serde(default)]
    pub hooks: HookSettings,

    /// Response cache backend
    #[serde(default)]
    pub cache: Option<CacheSettings>,
}

/// CRUD method to HTTP verb mapping
///
/// Verbs are kept as configured and resolved per call, so a bad verb is
/// reported as `InvalidMethod` by the operation that uses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMap {
    #[serde(default = "default_create")]
    pub create: String,
    #[serde(default = "default_find")]
    pub find: String,
    #[serde(default = "default_update")]
    pub update: String,
    #[serde(default = "default_destroy")]
    pub destroy: String,
}

/// Basic-auth credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Hook pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSettings {
    /// Append connection hooks after the built-in ones (true) or replace them (false)
    #[serde(default = "default_true")]
    pub merge: bool,
}

/// Response cache backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CacheSettings {
    /// In-process map
    Memory,
    /// Redis server
    Redis { url: String },
}

fn default_response_type() -> String {
    "json".to_string()
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_true() -> bool {
    true
}

fn default_create() -> String {
    HttpVerb::Post.to_string()
}

fn default_find() -> String {
    HttpVerb::Get.to_string()
}

fn default_update() -> String {
    HttpVerb::Put.to_string()
}

fn default_destroy() -> String {
    HttpVerb::Delete.to_string()
}

impl Default for MethodMap {
    fn default() -> Self {
        Self {
            create: default_create(),
            find: default_find(),
            update: default_update(),
            destroy: default_destroy(),
        }
    }
}

impl MethodMap {
    /// Configured verb name for a CRUD method
    pub fn verb_name(&self, method: CrudMethod) -> &str {
        match method {
            CrudMethod::Create => &self.create,
            CrudMethod::Find => &self.find,
            CrudMethod::Update => &self.update,
            CrudMethod::Destroy => &self.destroy,
        }
    }

    /// Resolve the HTTP verb for a CRUD method
    pub fn resolve(&self, method: CrudMethod) -> Result<HttpVerb> {
        let name = self.verb_name(method);
        HttpVerb::from_str(name).map_err(|_| RestError::InvalidMethod(name.to_string()))
    }
}

impl Default for HookSettings {
    fn default() -> Self {
        Self { merge: true }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            response_type: default_response_type(),
            protocol: default_protocol(),
            host: None,
            hostname: default_hostname(),
            port: None,
            pathname: String::new(),
            resource: None,
            action: None,
            query: Map::new(),
            methods: MethodMap::default(),
            headers: BTreeMap::new(),
            basic_auth: None,
            reject_unauthorized: true,
            timeout_secs: None,
            hooks: HookSettings::default(),
            cache: None,
        }
    }
}

impl ConnectionConfig {
    /// Create a config with defaults for the given identity
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Self::default()
        }
    }

    /// Build a config by deep-merging a caller-supplied JSON tree over the defaults
    pub fn from_value(value: Value) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        deep_merge(&mut merged, value);
        let config: Self = serde_json::from_value(merged)?;
        if config.identity.is_empty() {
            return Err(RestError::MissingIdentity);
        }
        Ok(config)
    }

    /// Set the host (with optional port)
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the protocol
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Set the base API path
    pub fn with_pathname(mut self, pathname: impl Into<String>) -> Self {
        self.pathname = pathname.into();
        self
    }

    /// Set a fixed resource name
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set a fixed action segment
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Map a CRUD method onto an HTTP verb name
    pub fn with_method(mut self, method: CrudMethod, verb: impl Into<String>) -> Self {
        let verb = verb.into();
        match method {
            CrudMethod::Create => self.methods.create = verb,
            CrudMethod::Find => self.methods.find = verb,
            CrudMethod::Update => self.methods.update = verb,
            CrudMethod::Destroy => self.methods.destroy = verb,
        }
        self
    }

    /// Apply per-call overrides: every key present in both `overrides` and
    /// this config replaces the config value
    pub fn with_overrides(&self, overrides: &Map<String, Value>) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self.clone());
        }

        let mut map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => return Err(RestError::Internal("connection config is not an object".into())),
        };
        let identity = map.get("identity").cloned();
        override_existing(&mut map, overrides);
        if let Some(identity) = identity {
            map.insert("identity".to_string(), identity);
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Scheme without a trailing `:` (`https:` is accepted)
    pub fn scheme(&self) -> &str {
        self.protocol.trim_end_matches(':')
    }

    /// Host and port part of the base URL
    pub fn authority(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), _) if !host.is_empty() => host.clone(),
            (_, Some(port)) => format!("{}:{}", self.hostname, port),
            _ => self.hostname.clone(),
        }
    }

    /// Base URL of the API server (scheme, host and port only)
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}://{}/", self.scheme(), self.authority()))?)
    }

    /// Resource name for a collection: the configured value or the pluralized collection name
    pub fn resource_name(&self, collection: &str) -> String {
        match &self.resource {
            Some(resource) if !resource.is_empty() => resource.clone(),
            _ => pluralize(collection),
        }
    }

    /// Default pathname rule: `pathname/resource[/action]`
    pub fn resource_pathname(&self, resource: &str) -> String {
        let base = self.pathname.trim_end_matches('/');
        let mut path = format!("{}/{}", base, resource.trim_matches('/'));
        if let Some(action) = self.action.as_deref().filter(|a| !a.is_empty()) {
            path.push('/');
            path.push_str(action.trim_matches('/'));
        }
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        path
    }
}
