//! Restbridge CLI
//!
//! Command-line interface for running CRUD calls against REST APIs.

use clap::Parser;
use restbridge_cli::{Cli, Commands};
use restbridge_core::RestError;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), RestError> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let target = cli.target();
    match cli.command {
        Commands::Find(cmd) => cmd.execute(&target).await?,
        Commands::Create(cmd) => cmd.execute(&target).await?,
        Commands::Update(cmd) => cmd.execute(&target).await?,
        Commands::Destroy(cmd) => cmd.execute(&target).await?,
        Commands::Describe(cmd) => cmd.execute(&target).await?,
        Commands::Validate(cmd) => cmd.execute(&target.config_path)?,
        Commands::Init(cmd) => cmd.execute()?,
        Commands::Completion(cmd) => cmd.execute(),
    }

    Ok(())
}
