//! Configuration validation

use once_cell::sync::Lazy;
use regex::Regex;
use restbridge_core::{AdapterConfig, CacheSettings, ConnectionConfig, RestError};
use restbridge_types::CrudMethod;
use std::collections::HashSet;

/// Valid identities and collection names (kebab, snake or camel case)
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*(?:[-_][A-Za-z0-9]+)*$").unwrap());

const PROTOCOLS: &[&str] = &["http", "https"];

/// Configuration validator
pub struct ConfigValidator {
    /// Whether to validate names strictly
    strict_names: bool,
}

impl ConfigValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self { strict_names: true }
    }

    /// Create a validator with lenient name checking
    pub fn lenient() -> Self {
        Self {
            strict_names: false,
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self, config: &AdapterConfig) -> Result<(), RestError> {
        self.validate_connections(config)?;
        self.validate_collections(config)?;
        self.validate_connection_references(config)?;
        Ok(())
    }

    fn validate_connections(&self, config: &AdapterConfig) -> Result<(), RestError> {
        let mut identities = HashSet::new();

        for connection in &config.connections {
            self.validate_name("connection identity", &connection.identity)?;

            if !identities.insert(&connection.identity) {
                return Err(RestError::Validation(format!(
                    "Duplicate connection identity: '{}'",
                    connection.identity
                )));
            }

            self.validate_connection(connection)?;
        }

        Ok(())
    }

    /// Validate a single connection's settings
    pub fn validate_connection(&self, connection: &ConnectionConfig) -> Result<(), RestError> {
        let identity = &connection.identity;

        if !PROTOCOLS.contains(&connection.protocol.as_str()) {
            return Err(RestError::Validation(format!(
                "Connection '{}' has unsupported protocol '{}' (expected http or https)",
                identity, connection.protocol
            )));
        }

        if connection.response_type != "json" {
            return Err(RestError::Validation(format!(
                "Connection '{}' has unsupported type '{}' (only json is supported)",
                identity, connection.response_type
            )));
        }

        if connection.authority().is_empty() {
            return Err(RestError::Validation(format!(
                "Connection '{}' has no host",
                identity
            )));
        }

        for method in CrudMethod::all() {
            connection.methods.resolve(*method).map_err(|_| {
                RestError::Validation(format!(
                    "Connection '{}': method '{}' maps to unknown HTTP verb '{}'",
                    identity,
                    method,
                    connection.methods.verb_name(*method)
                ))
            })?;
        }

        if let Some(CacheSettings::Redis { url }) = &connection.cache {
            if url.is_empty() {
                return Err(RestError::Validation(format!(
                    "Connection '{}' has a redis cache with an empty URL",
                    identity
                )));
            }
        }

        Ok(())
    }

    fn validate_collections(&self, config: &AdapterConfig) -> Result<(), RestError> {
        let mut names = HashSet::new();

        for collection in &config.collections {
            self.validate_name("collection name", &collection.name)?;

            if !names.insert(&collection.name) {
                return Err(RestError::Validation(format!(
                    "Duplicate collection name: '{}'",
                    collection.name
                )));
            }
        }

        Ok(())
    }

    /// Every collection must reference a declared connection
    fn validate_connection_references(&self, config: &AdapterConfig) -> Result<(), RestError> {
        let identities: HashSet<&str> = config
            .connections
            .iter()
            .map(|c| c.identity.as_str())
            .collect();

        for collection in &config.collections {
            if !identities.contains(collection.connection.as_str()) {
                return Err(RestError::Validation(format!(
                    "Collection '{}' references non-existent connection: '{}'",
                    collection.name, collection.connection
                )));
            }
        }

        Ok(())
    }

    fn validate_name(&self, kind: &str, name: &str) -> Result<(), RestError> {
        if name.is_empty() {
            return Err(RestError::Validation(format!("{} cannot be empty", kind)));
        }

        if self.strict_names && !NAME_PATTERN.is_match(name) {
            return Err(RestError::Validation(format!(
                "Invalid {} '{}': must start with a letter and contain only letters, digits, '-' or '_'",
                kind, name
            )));
        }

        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restbridge_core::CollectionConfig;

    fn create_config() -> AdapterConfig {
        AdapterConfig {
            connections: vec![ConnectionConfig::new("users-api").with_host("localhost:1337")],
            collections: vec![CollectionConfig::new("user", "users-api")],
        }
    }

    #[test]
    fn test_valid_config() {
        let validator = ConfigValidator::new();
        assert!(validator.validate(&create_config()).is_ok());
    }

    #[test]
    fn test_empty_identity() {
        let mut config = create_config();
        config.connections.push(ConnectionConfig::new(""));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_invalid_identity_lenient() {
        let mut config = create_config();
        config.connections.push(ConnectionConfig::new("Users API"));

        assert!(ConfigValidator::new().validate(&config).is_err());
        assert!(ConfigValidator::lenient().validate(&config).is_ok());
    }

    #[test]
    fn test_duplicate_identity() {
        let mut config = create_config();
        config.connections.push(ConnectionConfig::new("users-api"));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate connection identity"));
    }

    #[test]
    fn test_unsupported_protocol() {
        let mut config = create_config();
        config.connections[0] = config.connections[0].clone().with_protocol("ftp");

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported protocol"));
    }

    #[test]
    fn test_unsupported_response_type() {
        let mut config = create_config();
        config.connections[0].response_type = "xml".to_string();

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("only json"));
    }

    #[test]
    fn test_unknown_verb() {
        let mut config = create_config();
        config.connections[0] = config.connections[0]
            .clone()
            .with_method(CrudMethod::Destroy, "remove");

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("'remove'"));
    }

    #[test]
    fn test_legacy_del_verb_accepted() {
        let mut config = create_config();
        config.connections[0] = config.connections[0]
            .clone()
            .with_method(CrudMethod::Destroy, "del");

        assert!(ConfigValidator::new().validate(&config).is_ok());
    }

    #[test]
    fn test_empty_redis_url() {
        let mut config = create_config();
        config.connections[0].cache = Some(CacheSettings::Redis { url: String::new() });

        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_collection() {
        let mut config = create_config();
        config
            .collections
            .push(CollectionConfig::new("user", "users-api"));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate collection"));
    }

    #[test]
    fn test_missing_connection_reference() {
        let mut config = create_config();
        config
            .collections
            .push(CollectionConfig::new("invoice", "billing-api"));

        let err = ConfigValidator::new().validate(&config).unwrap_err();
        assert!(err.to_string().contains("non-existent connection"));
    }
}
