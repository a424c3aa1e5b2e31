//! Filesystem utilities for intake and delivery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use flip_core::types::ImageFormat;

use crate::error::TransformError;
use crate::models::InputFile;

/// Filesystem utility functions.
pub struct FsUtils;

impl FsUtils {
    /// Largest `-N` suffix tried before giving up on a free name.
    const MAX_SUFFIX: u32 = 10_000;

    /// Extract filename as String; returns `"unknown_file"` for empty paths.
    pub fn extract_filename_str(path: &Path) -> String {
        path.file_name()
            .and_then(|f| f.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown_file".to_string())
    }

    /// MIME type a host would report for `name`, by extension.
    pub fn guess_mime_type(name: &str) -> &'static str {
        ImageFormat::from_file_name(name)
            .map(|f| f.mime_type())
            .unwrap_or("application/octet-stream")
    }

    /// Build path-backed input files. Sizes come from metadata; content is
    /// read later by the transform stage.
    pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<InputFile>, TransformError> {
        paths
            .iter()
            .map(|p| {
                let path = p.as_ref();
                let name = Self::extract_filename_str(path);
                let metadata =
                    fs::metadata(path).map_err(|source| TransformError::ReadFailure {
                        name: name.clone(),
                        source,
                    })?;
                if !metadata.is_file() {
                    return Err(TransformError::ReadFailure {
                        name,
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "not a regular file",
                        ),
                    });
                }
                let declared = Self::guess_mime_type(&name);
                debug!(path = %path.display(), size = metadata.len(), declared, "Loaded input file");
                Ok(InputFile::from_path(
                    name,
                    path.to_path_buf(),
                    metadata.len(),
                    declared,
                ))
            })
            .collect()
    }

    /// Strip directory components and characters unsafe in a file name.
    pub fn sanitize_file_name(name: &str) -> String {
        let last = name.rsplit(['/', '\\']).next().unwrap_or(name);

        let sanitized: String = last
            .chars()
            .filter(|c| !c.is_control() && !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
            .take(200)
            .collect();

        let trimmed = sanitized.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            "unnamed_file".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Where to write `name` inside `dir`.
    ///
    /// With `overwrite` the plain path is returned. Otherwise the first of
    /// `name`, `stem-1.ext`, `stem-2.ext`, ... that does not exist yet.
    pub fn unique_destination(dir: &Path, name: &str, overwrite: bool) -> PathBuf {
        let safe = Self::sanitize_file_name(name);
        let candidate = dir.join(&safe);
        if overwrite || !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match safe.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
            _ => (safe.clone(), None),
        };

        for n in 1..=Self::MAX_SUFFIX {
            let next = match &ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
            let path = dir.join(next);
            if !path.exists() {
                return path;
            }
        }

        candidate
    }
}
