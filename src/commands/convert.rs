//! `flip convert`: run one conversion session over files on disk.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::output::{self, OutputFormat};
use flip_convert::filesystem::FsUtils;
use flip_convert::is_accepted;
use flip_core::capabilities;
use flip_core::config::AppConfig;
use flip_core::error::AppError;
use flip_core::types::{ConversionDirection, format_file_size};
use flip_session::{DirectorySink, Orchestrator, SessionStatus};

/// Direction as spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// First format of the site's pair to the second
    AToB,
    /// Second format of the site's pair to the first
    BToA,
}

impl From<DirectionArg> for ConversionDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::AToB => Self::AToB,
            DirectionArg::BToA => Self::BToA,
        }
    }
}

/// Arguments for the convert command
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Files to convert; files with other extensions are skipped
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Conversion direction (defaults to the site's)
    #[arg(short, long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Directory receiving the output
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Replace an existing output file instead of numbering the new one
    #[arg(long)]
    pub overwrite: bool,

    /// Run the transform on the calling task instead of the worker
    #[arg(long)]
    pub inline: bool,

    /// Print transform metrics afterwards
    #[arg(long)]
    pub stats: bool,
}

/// Summary printed after a successful conversion
#[derive(Debug, Serialize)]
struct ConvertSummary {
    /// Files converted
    files: usize,
    /// Paths skipped for their extension
    skipped: usize,
    /// Direction used
    direction: String,
    /// Saved file name
    output: String,
    /// Output directory
    out_dir: String,
    /// Input size
    input_size: String,
}

/// Execute the convert command
pub async fn execute(
    args: &ConvertArgs,
    mut config: AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    if let Some(dir) = &args.out_dir {
        config.download.output_dir = dir.to_string_lossy().to_string();
    }
    config.download.overwrite |= args.overwrite;
    if args.inline {
        config.worker.enabled = false;
    }

    let sink = DirectorySink::from_config(&config.download);
    let mut session = Orchestrator::new(&config, &capabilities::detect(), sink);
    if let Some(direction) = args.direction {
        session.set_direction(direction.into());
    }

    // Unaccepted paths are dropped by name so they are never stat'ed.
    let direction = session.state().direction();
    let (wanted, skipped): (Vec<&PathBuf>, Vec<&PathBuf>) =
        args.files.iter().partition(|path| {
            is_accepted(
                &FsUtils::extract_filename_str(path),
                direction,
                &config.site.formats,
            )
        });

    let files = FsUtils::load_paths(&wanted)?;
    let accepted = session.intake(files)?;
    if !skipped.is_empty() && format == OutputFormat::Table {
        output::print_warning(&format!(
            "Skipped {} file(s) not accepted for {}",
            skipped.len(),
            config.site.formats.describe(direction)
        ));
    }
    let input_bytes: u64 = session
        .state()
        .files()
        .iter()
        .map(|f| f.byte_length())
        .sum();

    session.start().await?;
    let status = session.settle().await;

    let result = match status {
        SessionStatus::Success => {
            let summary = ConvertSummary {
                files: accepted,
                skipped: skipped.len(),
                direction: config.site.formats.describe(session.state().direction()),
                output: session
                    .state()
                    .last_download_name()
                    .unwrap_or_default()
                    .to_string(),
                out_dir: config.download.output_dir.clone(),
                input_size: format_file_size(input_bytes),
            };
            match format {
                OutputFormat::Table => output::print_success(&format!(
                    "Converted {} file(s) into '{}' ({})",
                    summary.files, summary.output, summary.input_size
                )),
                OutputFormat::Json => output::print_item(&summary, format),
            }
            Ok(())
        }
        _ => Err(AppError::internal(
            session
                .state()
                .error_message()
                .unwrap_or("Conversion failed")
                .to_string(),
        )),
    };

    if args.stats {
        output::print_item(&session.metrics().snapshot(), format);
    }

    session.shutdown().await;
    result
}
