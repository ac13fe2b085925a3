//! Init command implementation

use clap::Args;
use restbridge_core::RestError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Init command arguments
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Connection identity
    #[arg(default_value = "main-api")]
    pub name: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: String,

    /// Example collection to bind to the connection
    #[arg(long, default_value = "user")]
    pub collection: String,
}

impl InitCommand {
    /// Write `restbridge.yaml` and `.env.example` into the output directory
    pub fn execute(&self) -> Result<(), RestError> {
        info!("Initializing Restbridge configuration: {}", self.name);

        let output_dir = Path::new(&self.output);
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let config_path = output_dir.join("restbridge.yaml");
        if config_path.exists() {
            return Err(RestError::Config(format!(
                "{} already exists",
                config_path.display()
            )));
        }
        fs::write(&config_path, self.generate_config())?;
        info!("Created: {}", config_path.display());

        let env_path = output_dir.join(".env.example");
        fs::write(&env_path, self.generate_env_example())?;
        info!("Created: {}", env_path.display());

        println!("\nRestbridge configuration initialized!");
        println!("\nNext steps:");
        println!("  1. Copy .env.example to .env and set API_HOST");
        println!("  2. Edit restbridge.yaml to describe your collections");
        println!("  3. Run: restbridge find {}", self.collection);

        Ok(())
    }

    fn generate_config(&self) -> String {
        format!(
            r#"# Restbridge configuration

connections:
  {name}:
    protocol: http
    host: "{{{{ env.API_HOST }}}}"
    pathname: /api/v1
    headers:
      accept: application/json
    methods:
      create: post
      find: get
      update: put
      destroy: delete
    cache:
      kind: memory

collections:
  {collection}:
    connection: {name}
    attributes:
      createdAt: datetime
      updatedAt: datetime
"#,
            name = self.name,
            collection = self.collection
        )
    }

    fn generate_env_example(&self) -> String {
        r#"# Host (and port) of the REST API
API_HOST=localhost:1337
"#
        .to_string()
    }
}
