//! `flip formats`: list the site's conversion directions.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use flip_core::config::AppConfig;
use flip_core::error::AppError;
use flip_core::types::ConversionDirection;

/// Display row for a direction
#[derive(Debug, Serialize, Tabled)]
struct DirectionRow {
    /// Direction key
    direction: String,
    /// Human description
    mode: String,
    /// Accepted input extensions
    accepts: String,
    /// Output extension
    output: String,
    /// Output MIME type
    mime_type: String,
    /// Selected at startup
    default: bool,
}

/// Execute the formats command
pub fn execute(config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let formats = &config.site.formats;

    let rows: Vec<DirectionRow> = [ConversionDirection::AToB, ConversionDirection::BToA]
        .into_iter()
        .map(|direction| {
            let target = formats.target(direction);
            DirectionRow {
                direction: direction.to_string(),
                mode: formats.describe(direction),
                accepts: formats
                    .accepted_suffixes(direction)
                    .iter()
                    .map(|s| format!(".{s}"))
                    .collect::<Vec<_>>()
                    .join(" "),
                output: format!(".{}", target.extension()),
                mime_type: target.mime_type().to_string(),
                default: direction == config.site.default_direction,
            }
        })
        .collect();

    if format == OutputFormat::Table {
        println!("{}:", config.site.name);
    }
    output::print_list(&rows, format);
    Ok(())
}
