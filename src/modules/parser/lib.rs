//! Configuration parsing for Restbridge
//!
//! This crate handles parsing of YAML configuration files describing REST
//! connections and the collections bound to them, with validation and
//! environment variable substitution.

pub mod env;
pub mod validator;
pub mod yaml;

pub use validator::ConfigValidator;
pub use yaml::YamlParser;

use restbridge_core::{AdapterConfig, RestError};

/// Parse a configuration file from a path
pub fn parse_file(path: &str) -> Result<AdapterConfig, RestError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RestError::Config(format!("Failed to read file '{}': {}", path, e)))?;

    parse_string(&content)
}

/// Parse a configuration from a string
pub fn parse_string(content: &str) -> Result<AdapterConfig, RestError> {
    let config = YamlParser::parse(content)?;

    let validator = ConfigValidator::new();
    validator.validate(&config)?;

    Ok(config)
}
