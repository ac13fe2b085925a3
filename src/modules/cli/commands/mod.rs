//! CLI commands

mod completion;
mod crud;
mod init;
mod inspect;

pub use completion::CompletionCommand;
pub use crud::{CreateCommand, DestroyCommand, FindCommand, Selector, UpdateCommand};
pub use init::InitCommand;
pub use inspect::{DescribeCommand, ValidateCommand};

use clap::{Parser, Subcommand};
use restbridge_core::{AdapterConfig, RestError};
use restbridge_parser::parse_file;
use restbridge_runtime::RestAdapter;
use serde::Serialize;
use tracing::{debug, info};

/// Restbridge - CRUD calls against REST APIs
#[derive(Parser, Debug)]
#[command(name = "restbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    ///
    /// Global, so it can follow the subcommand, e.g. `restbridge find user -f api.yaml`.
    #[arg(
        short = 'f',
        long = "file",
        global = true,
        default_value = "restbridge.yaml"
    )]
    pub config: String,

    /// Connection identity to use instead of the collection's configured one
    #[arg(long, global = true)]
    pub connection: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find records
    Find(FindCommand),

    /// Create a record
    Create(CreateCommand),

    /// Update records
    Update(UpdateCommand),

    /// Destroy records
    Destroy(DestroyCommand),

    /// Show a collection's attribute definitions
    Describe(DescribeCommand),

    /// Validate a configuration file
    Validate(ValidateCommand),

    /// Write a starter configuration
    Init(InitCommand),

    /// Generate shell completions
    #[command(hide = true)]
    Completion(CompletionCommand),
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration file and connection selection shared by all commands
    pub fn target(&self) -> Target {
        Target {
            config_path: self.config.clone(),
            connection: self.connection.clone(),
        }
    }
}

/// Where a command's calls go
#[derive(Debug, Clone)]
pub struct Target {
    pub config_path: String,
    pub connection: Option<String>,
}

impl Target {
    /// Load the configuration and register every connection it declares
    pub async fn open(&self) -> Result<(AdapterConfig, RestAdapter), RestError> {
        info!("Loading configuration from: {}", self.config_path);
        let config = parse_file(&self.config_path)?;
        let adapter = RestAdapter::from_config(&config).await?;
        Ok((config, adapter))
    }

    /// Identity of the connection serving a collection
    pub fn identity_for(&self, config: &AdapterConfig, collection: &str) -> Result<String, RestError> {
        let identity = match &self.connection {
            Some(identity) => identity.clone(),
            None => config
                .connection_for(collection)
                .map(str::to_string)
                .ok_or_else(|| {
                    RestError::Config(format!(
                        "Collection '{}' is not bound to a connection; pass --connection",
                        collection
                    ))
                })?,
        };
        debug!(collection, identity = %identity, "Resolved connection");
        Ok(identity)
    }
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), RestError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
