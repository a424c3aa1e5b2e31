//! Zip archive assembly for multi-file batches.
//!
//! Archives are built entirely in memory. Entries are stored under the
//! relabeled output name with DEFLATE compression at a configurable level.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use flip_core::config::ArchiveConfig;

use crate::error::TransformError;
use crate::models::Blob;

/// MIME type of every archive produced here.
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Incremental in-memory zip writer.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ArchiveBuilder {
    /// Start an archive for `entry_count` entries, picking the level from config.
    pub fn new(config: &ArchiveConfig, entry_count: usize) -> Self {
        Self::with_level(config.level_for(entry_count))
    }

    /// Start an empty archive compressed at `level` (0-9).
    pub fn with_level(level: i64) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(level))
            .large_file(false);

        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            names: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Append an entry. Names must be unique within one archive.
    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), TransformError> {
        if !self.seen.insert(name.to_string()) {
            return Err(TransformError::DuplicateEntry {
                name: name.to_string(),
            });
        }

        let options = if bytes.len() as u64 >= u32::MAX as u64 {
            self.options.large_file(true)
        } else {
            self.options
        };

        self.writer.start_file(name, options)?;
        self.writer
            .write_all(bytes)
            .map_err(|e| TransformError::ArchiveFailure(e.into()))?;
        self.names.push(name.to_string());

        debug!(entry = %name, size = bytes.len(), "Added archive entry");
        Ok(())
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no entry has been written.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Finalize the archive, returning its blob and the entry names in order.
    pub fn finish(self) -> Result<(Blob, Vec<String>), TransformError> {
        let cursor = self.writer.finish()?;
        let bytes = cursor.into_inner();
        Ok((Blob::new(bytes, ARCHIVE_MIME_TYPE), self.names))
    }
}

/// Decide which file fills each position of `names` in the archive.
///
/// When two outputs share a name the entry keeps the position of its
/// first occurrence and takes the content of its last, the way a map
/// keyed by name behaves when the same key is set twice. Position `i`
/// maps to `Some(source)` when it opens an entry and to `None` when a
/// name already has its slot; files never chosen as a source are never
/// read.
pub fn plan_entries(names: &[String]) -> Vec<Option<usize>> {
    let mut last_seen: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in names.iter().enumerate() {
        last_seen.insert(name.as_str(), idx);
    }

    let mut opened: HashSet<&str> = HashSet::new();
    let plan: Vec<Option<usize>> = names
        .iter()
        .map(|name| {
            if opened.insert(name.as_str()) {
                last_seen.get(name.as_str()).copied()
            } else {
                None
            }
        })
        .collect();

    if opened.len() < names.len() {
        warn!(
            total = names.len(),
            kept = opened.len(),
            "Duplicate output names in batch; later files replace earlier ones"
        );
    }

    plan
}
