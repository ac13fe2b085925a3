//! YAML configuration parser

use restbridge_core::{
    AdapterConfig, CollectionConfig, CollectionDefinition, ConnectionConfig, RestError,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::env::EnvSubstitutor;

/// YAML parser for Restbridge configuration files
pub struct YamlParser;

/// Map-based schema: connections and collections keyed by name.
#[derive(Debug, Deserialize)]
struct MapConfig {
    #[serde(default)]
    connections: BTreeMap<String, serde_yaml::Value>,

    #[serde(default)]
    collections: BTreeMap<String, MapCollection>,
}

#[derive(Debug, Deserialize)]
struct MapCollection {
    /// Omitted when the file declares a single connection
    #[serde(default)]
    connection: Option<String>,

    #[serde(default)]
    attributes: CollectionDefinition,
}

impl YamlParser {
    /// Parse a YAML string into an adapter configuration
    pub fn parse(content: &str) -> Result<AdapterConfig, RestError> {
        let substitutor = EnvSubstitutor::new();
        let substituted = substitutor.substitute(content)?;
        Self::parse_raw(&substituted)
    }

    /// Parse a YAML string without environment variable substitution
    pub fn parse_raw(content: &str) -> Result<AdapterConfig, RestError> {
        // List-based schema first, it maps onto the model directly.
        if let Ok(config) = serde_yaml::from_str::<AdapterConfig>(content) {
            return Ok(config);
        }

        let map = serde_yaml::from_str::<MapConfig>(content)
            .map_err(|e| RestError::Config(format!("YAML parse error: {}", e)))?;
        map_to_config(map)
    }
}

fn map_to_config(map: MapConfig) -> Result<AdapterConfig, RestError> {
    let mut connections = Vec::with_capacity(map.connections.len());
    for (identity, raw) in map.connections {
        let mut value = yaml_to_json(raw).map_err(|e| {
            RestError::Config(format!("Connection '{}' is not valid: {}", identity, e))
        })?;

        match &mut value {
            Value::Object(fields) => {
                fields.insert("identity".to_string(), Value::String(identity.clone()));
            }
            Value::Null => {
                value = serde_json::json!({ "identity": identity });
            }
            _ => {
                return Err(RestError::Config(format!(
                    "Connection '{}' must be a mapping",
                    identity
                )))
            }
        }

        let config = ConnectionConfig::from_value(value).map_err(|e| {
            RestError::Config(format!("Connection '{}' is not valid: {}", identity, e))
        })?;
        connections.push(config);
    }

    let only_connection = match connections.as_slice() {
        [only] => Some(only.identity.clone()),
        _ => None,
    };

    let mut collections = Vec::with_capacity(map.collections.len());
    for (name, collection) in map.collections {
        let connection = collection
            .connection
            .or_else(|| only_connection.clone())
            .ok_or_else(|| {
                RestError::Config(format!("Collection '{}' is missing 'connection'", name))
            })?;
        collections.push(CollectionConfig::new(name, connection).with_attributes(collection.attributes));
    }

    Ok(AdapterConfig {
        connections,
        collections,
    })
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}
