//! Download destination configuration.

use serde::{Deserialize, Serialize};

/// Where forced downloads land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory receiving converted files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Replace an existing file with the same name instead of picking
    /// a numbered name.
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            overwrite: false,
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}
