//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional `config/default.toml`, an optional explicit file, and
//! `FLIP__`-prefixed environment variables. Each sub-module represents a
//! logical configuration section; every field has a default so an empty
//! source still yields a working configuration.

pub mod archive;
pub mod download;
pub mod logging;
pub mod site;
pub mod worker;

use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

pub use self::archive::ArchiveConfig;
pub use self::download::DownloadConfig;
pub use self::logging::LoggingConfig;
pub use self::site::SiteConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Built once at startup and handed explicitly to the components that
/// need it; nothing reads configuration ambiently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Site identity, format pair, and default direction.
    #[serde(default)]
    #[validate(nested)]
    pub site: SiteConfig,
    /// Background transform worker settings.
    #[serde(default)]
    #[validate(nested)]
    pub worker: WorkerConfig,
    /// Archive builder settings.
    #[serde(default)]
    #[validate(nested)]
    pub archive: ArchiveConfig,
    /// Forced-download destination settings.
    #[serde(default)]
    pub download: DownloadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges `config/default.toml` (if present), then `path` (required
    /// when given), then environment variables such as
    /// `FLIP__WORKER__ENABLED=false`. The merged result is validated.
    pub fn load(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("FLIP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()?;
        debug!(
            explicit_file = path.unwrap_or("-"),
            site = %app.site.name,
            worker_enabled = app.worker.enabled,
            "Configuration loaded"
        );
        Ok(app)
    }

    /// Render the configuration as pretty JSON for display.
    pub fn to_pretty_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
