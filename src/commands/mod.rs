//! CLI command definitions and dispatch.

pub mod capabilities;
pub mod config;
pub mod convert;
pub mod formats;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use flip_core::config::AppConfig;
use flip_core::error::AppError;

/// flip: drop image files in, get them back as the other format
#[derive(Debug, Parser)]
#[command(name = "flip", version, about, long_about = None)]
pub struct Cli {
    /// Path to an extra configuration file (merged over config/default.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert files and save the result
    Convert(convert::ConvertArgs),
    /// Show what the host supports
    Capabilities,
    /// Show the site's conversion directions
    Formats,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: Result<AppConfig, AppError>) -> Result<(), AppError> {
        match &self.command {
            Commands::Convert(args) => convert::execute(args, config?, self.format).await,
            Commands::Capabilities => capabilities::execute(self.format),
            Commands::Formats => formats::execute(&config?, self.format),
            Commands::Config(args) => {
                config::execute(args, config, self.config.as_deref(), self.format).await
            }
        }
    }
}
