//! Archive builder configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for bundling multi-file batches into a zip archive.
///
/// Image payloads are usually already compressed, so the default deflate
/// level favors speed over ratio.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ArchiveConfig {
    /// Deflate level used for batches (0-9).
    #[serde(default = "default_level")]
    #[validate(range(min = 0, max = 9))]
    pub level: i64,
    /// Optional level for batches of at most `small_batch_max` files.
    #[serde(default)]
    #[validate(range(min = 0, max = 9))]
    pub small_batch_level: Option<i64>,
    /// Largest batch that counts as small.
    #[serde(default = "default_small_batch_max")]
    pub small_batch_max: usize,
    /// Name suggested for the downloaded archive.
    #[serde(default = "default_file_name")]
    #[validate(length(min = 1))]
    pub file_name: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            small_batch_level: None,
            small_batch_max: default_small_batch_max(),
            file_name: default_file_name(),
        }
    }
}

impl ArchiveConfig {
    /// Deflate level for a batch of `entry_count` files.
    pub fn level_for(&self, entry_count: usize) -> i64 {
        match self.small_batch_level {
            Some(level) if entry_count <= self.small_batch_max => level,
            _ => self.level,
        }
    }
}

fn default_level() -> i64 {
    3
}

fn default_small_batch_max() -> usize {
    10
}

fn default_file_name() -> String {
    "converted_images.zip".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_ignores_batch_size() {
        let config = ArchiveConfig::default();
        assert_eq!(config.level_for(2), 3);
        assert_eq!(config.level_for(500), 3);
    }

    #[test]
    fn test_small_batch_level_applies_up_to_threshold() {
        let config = ArchiveConfig {
            small_batch_level: Some(6),
            ..Default::default()
        };
        assert_eq!(config.level_for(10), 6);
        assert_eq!(config.level_for(11), 3);
    }
}
