//! Site configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{ConversionDirection, FormatPair};

/// Site identity and conversion defaults.
///
/// The orchestrator only reads `formats` and `default_direction`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SiteConfig {
    /// Display name, e.g. `"JPGFlip"`.
    #[serde(default = "default_name")]
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Formats the site converts between.
    #[serde(default)]
    pub formats: FormatPair,
    /// Direction selected when a session starts.
    #[serde(default = "default_direction")]
    pub default_direction: ConversionDirection,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            formats: FormatPair::default(),
            default_direction: default_direction(),
        }
    }
}

fn default_name() -> String {
    "JPGFlip".to_string()
}

fn default_direction() -> ConversionDirection {
    ConversionDirection::BToA
}
