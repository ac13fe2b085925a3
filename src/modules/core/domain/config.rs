//! Root adapter configuration

use serde::{Deserialize, Serialize};

use super::{CollectionDefinition, ConnectionConfig};

/// Root configuration: the connections to register and the collections bound to them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// REST connections
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,

    /// Collection definitions
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

/// A collection bound to a connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection name (singular model name, e.g. `user`)
    pub name: String,

    /// Identity of the connection serving this collection
    pub connection: String,

    /// Attribute definitions
    #[serde(default)]
    pub attributes: CollectionDefinition,
}

impl CollectionConfig {
    /// Create a collection bound to the given connection
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection: connection.into(),
            attributes: CollectionDefinition::default(),
        }
    }

    /// Set the attribute definitions
    pub fn with_attributes(mut self, attributes: CollectionDefinition) -> Self {
        self.attributes = attributes;
        self
    }
}

impl AdapterConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a connection by identity
    pub fn find_connection(&self, identity: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.identity == identity)
    }

    /// Find a collection by name
    pub fn find_collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Identity of the connection serving a collection
    ///
    /// Falls back to the only connection when the collection is not declared
    /// and exactly one connection exists.
    pub fn connection_for(&self, collection: &str) -> Option<&str> {
        if let Some(declared) = self.find_collection(collection) {
            return Some(declared.connection.as_str());
        }
        match self.connections.as_slice() {
            [only] => Some(only.identity.as_str()),
            _ => None,
        }
    }
}
