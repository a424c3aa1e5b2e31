//! Domain models: input files, blobs, transform requests and results.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use flip_core::types::{ConversionDirection, FormatPair, ImageFormat};

use crate::error::TransformError;

// ---------------------------------------------------------------------------
// InputFile
// ---------------------------------------------------------------------------

/// Where an input file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Bytes already held in memory.
    Memory(Bytes),
    /// A file on disk, read when the transform needs it.
    Path(PathBuf),
}

/// A file handed over by the host (drop zone, picker, command line).
///
/// Immutable once constructed. Path-backed files are read lazily so that
/// a batch only holds one file's bytes at a time.
#[derive(Debug, Clone)]
pub struct InputFile {
    name: String,
    byte_length: u64,
    declared_type: String,
    source: FileSource,
}

impl InputFile {
    /// Create an in-memory input file.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: impl Into<Bytes>,
        declared_type: impl Into<String>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            byte_length: bytes.len() as u64,
            declared_type: declared_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Create a path-backed input file.
    pub fn from_path(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        byte_length: u64,
        declared_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            byte_length,
            declared_type: declared_type.into(),
            source: FileSource::Path(path.into()),
        }
    }

    /// Logical file name (no directory components).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size reported by the host.
    pub fn byte_length(&self) -> u64 {
        self.byte_length
    }

    /// MIME type reported by the host.
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Backing source.
    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Read the file's full byte content.
    pub fn read_bytes(&self) -> Result<Bytes, TransformError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => read_path(&self.name, path),
        }
    }
}

fn read_path(name: &str, path: &Path) -> Result<Bytes, TransformError> {
    std::fs::read(path)
        .map(Bytes::from)
        .map_err(|source| TransformError::ReadFailure {
            name: name.to_string(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Bytes labeled with a MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Content.
    pub bytes: Bytes,
    /// Declared MIME type.
    pub mime_type: String,
}

impl Blob {
    /// Wrap bytes under a MIME type.
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TransformRequest
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier tagging each transform request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One conversion attempt.
///
/// `direction`, `target`, and `expected_count` are frozen when the request
/// is built; later changes to the session never reach a request in flight.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// Identifier used to discard superseded results.
    pub request_id: RequestId,
    /// Files in submission order.
    pub files: Arc<[InputFile]>,
    /// Direction captured at request time.
    pub direction: ConversionDirection,
    /// Target format implied by `direction`.
    pub target: ImageFormat,
    /// File count captured at request time.
    pub expected_count: usize,
}

impl TransformRequest {
    /// Build a request, resolving the target format from the site's pair.
    pub fn new(
        request_id: RequestId,
        files: Arc<[InputFile]>,
        direction: ConversionDirection,
        formats: &FormatPair,
    ) -> Self {
        let expected_count = files.len();
        Self {
            request_id,
            files,
            direction,
            target: formats.target(direction),
            expected_count,
        }
    }

    /// Whether the request produces a single relabeled file.
    pub fn is_single(&self) -> bool {
        self.expected_count == 1
    }
}

// ---------------------------------------------------------------------------
// TransformResult
// ---------------------------------------------------------------------------

/// Everything the transform stage can report.
///
/// `Progress` may repeat; exactly one of the other variants ends a request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    /// One relabeled file.
    Single {
        /// Output bytes under the target MIME type.
        blob: Blob,
        /// Target MIME type.
        mime_type: String,
        /// `<original-base-name>.<targetExt>`.
        suggested_name: String,
    },
    /// A zip archive of all relabeled files.
    Archive {
        /// Archive bytes (`application/zip`).
        blob: Blob,
        /// Archive name, `converted_images.zip` by default.
        suggested_name: String,
        /// Entry names in archive order.
        entry_names: Vec<String>,
    },
    /// Batch progress.
    Progress {
        /// Percent of files processed, 0-100.
        percent: u8,
        /// 1-based index of the file just processed.
        current_index: usize,
    },
    /// The request failed; no partial output exists.
    Failure {
        /// User-readable reason.
        message: String,
    },
}

impl TransformResult {
    /// Whether this result ends its request.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    /// Name suggested for the download, if this is an output.
    pub fn suggested_name(&self) -> Option<&str> {
        match self {
            Self::Single { suggested_name, .. } | Self::Archive { suggested_name, .. } => {
                Some(suggested_name)
            }
            _ => None,
        }
    }

    /// Output blob, if this is an output.
    pub fn blob(&self) -> Option<&Blob> {
        match self {
            Self::Single { blob, .. } | Self::Archive { blob, .. } => Some(blob),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_file_reports_length() {
        let file = InputFile::from_bytes("a.jpg", vec![1u8, 2, 3], "image/jpeg");
        assert_eq!(file.byte_length(), 3);
        assert_eq!(file.read_bytes().expect("read").as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_missing_path_is_read_failure() {
        let file = InputFile::from_path("ghost.jpg", "/nonexistent/ghost.jpg", 10, "image/jpeg");
        let err = file.read_bytes().expect_err("should fail");
        assert!(matches!(err, TransformError::ReadFailure { ref name, .. } if name == "ghost.jpg"));
    }

    #[test]
    fn test_request_freezes_count_and_target() {
        let files: Arc<[InputFile]> = vec![
            InputFile::from_bytes("a.jpg", vec![0u8], "image/jpeg"),
            InputFile::from_bytes("b.jpg", vec![0u8], "image/jpeg"),
        ]
        .into();
        let request = TransformRequest::new(
            RequestId(7),
            files,
            ConversionDirection::BToA,
            &FormatPair::default(),
        );
        assert_eq!(request.expected_count, 2);
        assert_eq!(request.target, ImageFormat::Avif);
        assert!(!request.is_single());
    }

    #[test]
    fn test_progress_is_not_terminal() {
        let progress = TransformResult::Progress {
            percent: 10,
            current_index: 1,
        };
        assert!(!progress.is_terminal());
        assert!(progress.blob().is_none());

        let failure = TransformResult::Failure {
            message: "boom".to_string(),
        };
        assert!(failure.is_terminal());
    }
}
