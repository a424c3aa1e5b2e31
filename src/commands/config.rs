//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use flip_core::config::AppConfig;
use flip_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration sources
    Validate,
    /// Write the default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config: Result<AppConfig, AppError>,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let source = config_path.unwrap_or("config/default.toml");

    match &args.command {
        ConfigCommand::Show => {
            let config = config?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match config {
            Ok(config) => {
                output::print_success(&format!("Configuration '{}' is valid", source));
                output::print_kv("Site", &config.site.name);
                output::print_kv(
                    "Default mode",
                    &config.site.formats.describe(config.site.default_direction),
                );
                output::print_kv("Worker", if config.worker.enabled { "enabled" } else { "disabled" });
                output::print_kv("Archive level", &config.archive.level.to_string());
                output::print_kv("Output dir", &config.download.output_dir);
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create dir: {}", e)))?;
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::internal(format!("Failed to write config: {}", e)))?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}
