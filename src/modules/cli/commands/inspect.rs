//! Describe and validate commands

use clap::Args;
use restbridge_core::RestError;
use restbridge_parser::parse_file;
use serde_json::Value;
use tracing::info;

use super::{print_json, Target};

/// Describe command arguments
#[derive(Args, Debug)]
pub struct DescribeCommand {
    /// Collection name
    pub collection: String,
}

impl DescribeCommand {
    /// Print the collection's definition, or `null` when none is registered
    pub async fn execute(&self, target: &Target) -> Result<(), RestError> {
        let (config, adapter) = target.open().await?;
        let identity = target.identity_for(&config, &self.collection)?;

        match adapter.describe(&identity, &self.collection).await? {
            Some(definition) => print_json(&definition),
            None => print_json(&Value::Null),
        }
    }
}

/// Validate command arguments
#[derive(Args, Debug)]
pub struct ValidateCommand {}

impl ValidateCommand {
    pub fn execute(&self, config_path: &str) -> Result<(), RestError> {
        let config = parse_file(config_path)?;
        info!(
            connections = config.connections.len(),
            collections = config.collections.len(),
            "Configuration is valid"
        );
        println!("{} is valid", config_path);
        Ok(())
    }
}
