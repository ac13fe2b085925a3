//! Connection registry
//!
//! Holds every registered REST connection by identity, together with the
//! capabilities bound to it at registration: hooks, formatters, cache,
//! transport and collection definitions.

use restbridge_core::{CollectionDefinition, ConnectionConfig, RestError};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::builder::{PathnameResolver, RequestBuilder};
use crate::cache::{self, ResponseCache};
use crate::hooks::HookPipeline;
use crate::normalizer::ResultFormatters;
use crate::transport::{ReqwestTransport, Transport};

/// Everything needed to register one connection
pub struct Registration {
    config: ConnectionConfig,
    collections: HashMap<String, CollectionDefinition>,
    hooks: HookPipeline,
    formatters: ResultFormatters,
    pathname_resolver: Option<Arc<dyn PathnameResolver>>,
    cache: Option<Arc<dyn ResponseCache>>,
    transport: Option<Arc<dyn Transport>>,
}

impl Registration {
    /// Register a connection with the given config
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            collections: HashMap::new(),
            hooks: HookPipeline::new(),
            formatters: ResultFormatters::default(),
            pathname_resolver: None,
            cache: None,
            transport: None,
        }
    }

    /// Register a connection from a JSON tree deep-merged over the defaults
    pub fn from_value(value: Value) -> Result<Self, RestError> {
        Ok(Self::new(ConnectionConfig::from_value(value)?))
    }

    /// Connection identity
    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    /// Define a collection served by this connection
    pub fn with_collection(
        mut self,
        name: impl Into<String>,
        definition: CollectionDefinition,
    ) -> Self {
        self.collections.insert(name.into(), definition);
        self
    }

    /// Connection hooks, merged with or replacing the defaults per `hooks.merge`
    pub fn with_hooks(mut self, hooks: HookPipeline) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_formatters(mut self, formatters: ResultFormatters) -> Self {
        self.formatters = formatters;
        self
    }

    /// Replace the default pathname rule
    pub fn with_pathname_resolver(mut self, resolver: impl PathnameResolver + 'static) -> Self {
        self.pathname_resolver = Some(Arc::new(resolver));
        self
    }

    /// Use a cache instance instead of the one described by `config.cache`
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a transport instead of the default reqwest client
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// A registered connection
pub struct Connection {
    config: ConnectionConfig,
    base_url: Url,
    hooks: HookPipeline,
    formatters: ResultFormatters,
    pathname_resolver: Option<Arc<dyn PathnameResolver>>,
    cache: Option<Arc<dyn ResponseCache>>,
    transport: Arc<dyn Transport>,
    definitions: RwLock<HashMap<String, CollectionDefinition>>,
}

impl Connection {
    pub fn identity(&self) -> &str {
        &self.config.identity
    }

    /// Registered config (never mutated by calls)
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Base endpoint resolved at registration
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn hooks(&self) -> &HookPipeline {
        &self.hooks
    }

    pub fn formatters(&self) -> &ResultFormatters {
        &self.formatters
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResponseCache>> {
        self.cache.as_ref()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Request builder bound to this connection
    pub fn request_builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.config).with_resolver(self.pathname_resolver.as_deref())
    }

    /// Store or replace a collection definition
    pub async fn define(&self, collection: &str, definition: CollectionDefinition) {
        debug!(
            "Defining collection '{}' on '{}'",
            collection,
            self.identity()
        );
        self.definitions
            .write()
            .await
            .insert(collection.to_string(), definition);
    }

    /// Definition of a collection, if one was stored
    pub async fn describe(&self, collection: &str) -> Option<CollectionDefinition> {
        self.definitions.read().await.get(collection).cloned()
    }

    /// Names of all defined collections
    pub async fn collections(&self) -> Vec<String> {
        self.definitions.read().await.keys().cloned().collect()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("identity", &self.config.identity)
            .field("base_url", &self.base_url.as_str())
            .field("hooks", &self.hooks)
            .field("cache", &self.cache.as_ref().map(|c| c.backend()))
            .field("transport", &self.transport.transport_type())
            .finish()
    }
}

/// Manages registered connections by identity
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection
    ///
    /// Fails with `MissingIdentity` or `DuplicateIdentity`; an existing
    /// registration is never touched.
    pub async fn register(&self, registration: Registration) -> Result<Arc<Connection>, RestError> {
        let Registration {
            config,
            collections,
            hooks,
            formatters,
            pathname_resolver,
            cache,
            transport,
        } = registration;

        if config.identity.is_empty() {
            return Err(RestError::MissingIdentity);
        }
        if self.has(&config.identity).await {
            return Err(RestError::DuplicateIdentity(config.identity));
        }
        if !config.response_type.eq_ignore_ascii_case("json") {
            return Err(RestError::Config(format!(
                "Unsupported response type '{}' for connection '{}'",
                config.response_type, config.identity
            )));
        }

        let base_url = config.base_url()?;

        let cache = match (cache, &config.cache) {
            (Some(cache), _) => Some(cache),
            (None, Some(settings)) => Some(cache::from_settings(settings).await?),
            (None, None) => None,
        };

        let transport: Arc<dyn Transport> = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };

        let hooks = HookPipeline::compose(&config.hooks, hooks);
        let identity = config.identity.clone();

        let connection = Arc::new(Connection {
            config,
            base_url,
            hooks,
            formatters,
            pathname_resolver,
            cache,
            transport,
            definitions: RwLock::new(collections),
        });

        let mut connections = self.connections.write().await;
        if connections.contains_key(&identity) {
            return Err(RestError::DuplicateIdentity(identity));
        }
        connections.insert(identity.clone(), connection.clone());

        info!(
            "Registered connection '{}' at {}",
            identity,
            connection.base_url()
        );
        Ok(connection)
    }

    /// Remove one connection, or every connection when no identity is given
    ///
    /// Removing an unknown identity is a no-op.
    pub async fn unregister(&self, identity: Option<&str>) {
        let mut connections = self.connections.write().await;
        match identity {
            Some(identity) => {
                if connections.remove(identity).is_some() {
                    info!("Unregistered connection '{}'", identity);
                }
            }
            None => {
                info!("Unregistering {} connection(s)", connections.len());
                connections.clear();
            }
        }
    }

    /// Get a connection by identity
    pub async fn get(&self, identity: &str) -> Result<Arc<Connection>, RestError> {
        let connections = self.connections.read().await;
        connections
            .get(identity)
            .cloned()
            .ok_or_else(|| RestError::UnknownIdentity(identity.to_string()))
    }

    /// Check if a connection exists
    pub async fn has(&self, identity: &str) -> bool {
        let connections = self.connections.read().await;
        connections.contains_key(identity)
    }

    /// Get the identities of all registered connections
    pub async fn names(&self) -> Vec<String> {
        let connections = self.connections.read().await;
        connections.keys().cloned().collect()
    }

    /// Store a collection definition on a connection
    pub async fn define(
        &self,
        identity: &str,
        collection: &str,
        definition: CollectionDefinition,
    ) -> Result<(), RestError> {
        self.get(identity).await?.define(collection, definition).await;
        Ok(())
    }

    /// Collection definition stored on a connection
    pub async fn describe(
        &self,
        identity: &str,
        collection: &str,
    ) -> Result<Option<CollectionDefinition>, RestError> {
        Ok(self.get(identity).await?.describe(collection).await)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
