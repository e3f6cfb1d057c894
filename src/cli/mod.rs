//! # Command Line Interface
//!
//! Prepare, rebuild and inspect a sandbox from the shell or a CI script.
//! Settings come from an optional file, `DBSANDBOX_*` variables (a `.env`
//! file is honoured) and finally the flags below.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, SandboxSettings};
use crate::observability::init_logging;
use crate::sandbox::{PostgresSandboxProvider, SandboxProvider};

#[derive(Parser, Debug)]
#[command(name = "dbsandbox")]
#[command(about = "PostgreSQL template sandboxes for test suites")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (YAML, TOML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Application database URL; supplies host, port and primary database
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Primary database override
    #[arg(long, global = true)]
    pub primary: Option<String>,

    /// Template database override
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Build the template database from the primary database if it is missing
    Prepare,

    /// Drop the primary database and recreate it from the template
    Rebuild,

    /// Report whether the template database exists
    Status,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings
    pub fn apply_overrides(&self, mut settings: SandboxSettings) -> SandboxSettings {
        if let Some(url) = &self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(primary) = &self.primary {
            settings.primary_database = Some(primary.clone());
        }
        if let Some(template) = &self.template {
            settings.template_database = template.clone();
        }
        if self.verbose {
            settings.log_level = "debug".to_string();
        }
        if self.json_logs {
            settings.json_logging = true;
        }
        settings
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    let settings = cli.apply_overrides(load_settings(cli.config.as_deref())?);
    init_logging(&settings.log_level, settings.json_logging)?;

    let provider = PostgresSandboxProvider::from_settings(settings)?;
    let config = provider.config();
    tracing::info!(
        server = %format!("{}:{}", config.host(), config.port()),
        primary = %config.primary_database(),
        template = %config.template_database(),
        command = ?cli.command,
        "Running sandbox command"
    );

    match cli.command {
        Commands::Prepare => {
            let outcome = provider.prepare_with_outcome().await?;
            println!("Template '{}': {}", config.template_database(), outcome);
        }

        Commands::Rebuild => {
            provider.rebuild().await?;
            println!(
                "✅ '{}' rebuilt from template '{}'",
                config.primary_database(),
                config.template_database()
            );
        }

        Commands::Status => {
            let exists = provider.template_exists().await?;
            println!("{}", template_status(config.template_database(), exists)?);
        }
    }

    Ok(())
}

/// Status line for an existing template; a missing one is an error so the
/// process exits non-zero.
fn template_status(template: &str, exists: bool) -> anyhow::Result<String> {
    if !exists {
        anyhow::bail!("Template '{}' does not exist", template);
    }
    Ok(format!("✅ Template '{}' exists", template))
}
