//! Download URLs and delivery sinks.
//!
//! A [`DownloadRegistry`] hands out opaque URLs for output blobs the way a
//! browser hands out object URLs: each one pins its blob until revoked. A
//! [`DownloadSink`] performs the forced download itself.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use flip_convert::Blob;
use flip_convert::filesystem::FsUtils;
use flip_core::config::DownloadConfig;

use crate::error::SessionError;

/// MIME type that forces a save rather than inline display.
pub const FORCE_DOWNLOAD_MIME_TYPE: &str = "application/octet-stream";

const URL_PREFIX: &str = "blob:flip/";

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Opaque handle to a registered blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadUrl(String);

impl DownloadUrl {
    /// The URL text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live download URLs and the blobs they pin.
#[derive(Debug, Default)]
pub struct DownloadRegistry {
    entries: HashMap<DownloadUrl, Blob>,
}

impl DownloadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a blob and return its URL.
    pub fn create(&mut self, blob: Blob) -> DownloadUrl {
        let url = DownloadUrl(format!("{URL_PREFIX}{}", Uuid::new_v4()));
        debug!(url = %url, size = blob.len(), "Registered download URL");
        self.entries.insert(url.clone(), blob);
        url
    }

    /// Release a URL. Returns whether it was live.
    pub fn revoke(&mut self, url: &DownloadUrl) -> bool {
        let live = self.entries.remove(url).is_some();
        if live {
            debug!(url = %url, "Revoked download URL");
        }
        live
    }

    /// The blob behind a live URL.
    pub fn get(&self, url: &DownloadUrl) -> Option<&Blob> {
        self.entries.get(url)
    }

    /// Number of URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Triggers and sinks
// ---------------------------------------------------------------------------

/// A one-shot request to save a blob under a name.
#[derive(Debug, Clone)]
pub struct DownloadTrigger {
    /// URL the blob is registered under.
    pub url: DownloadUrl,
    /// Name the user sees.
    pub file_name: String,
    /// MIME type used to force the save.
    pub mime_type: String,
    /// Content to save.
    pub blob: Blob,
}

/// Outcome of a dispatched trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Name the content was saved under.
    pub file_name: String,
    /// Where it landed, for sinks that write to disk.
    pub location: Option<PathBuf>,
    /// Bytes written.
    pub bytes: u64,
}

/// Performs forced downloads.
pub trait DownloadSink: Send {
    /// Deliver the trigger's blob. Called once per trigger.
    fn dispatch(&mut self, trigger: &DownloadTrigger) -> Result<Delivery, SessionError>;
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    /// Sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }

    /// Sink built from the `download` config section.
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(&config.output_dir, config.overwrite)
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn dispatch(&mut self, trigger: &DownloadTrigger) -> Result<Delivery, SessionError> {
        let io_err = |path: &Path, source| SessionError::Download {
            name: trigger.file_name.clone(),
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let path = FsUtils::unique_destination(&self.dir, &trigger.file_name, self.overwrite);
        fs::write(&path, &trigger.blob.bytes).map_err(|e| io_err(&path, e))?;

        info!(
            path = %path.display(),
            size = trigger.blob.len(),
            mime = %trigger.mime_type,
            "Saved download"
        );

        Ok(Delivery {
            file_name: FsUtils::extract_filename_str(&path),
            location: Some(path),
            bytes: trigger.blob.len() as u64,
        })
    }
}

/// Keeps every delivered trigger in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    delivered: Vec<DownloadTrigger>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers received so far, oldest first.
    pub fn delivered(&self) -> &[DownloadTrigger] {
        &self.delivered
    }
}

impl DownloadSink for MemorySink {
    fn dispatch(&mut self, trigger: &DownloadTrigger) -> Result<Delivery, SessionError> {
        self.delivered.push(trigger.clone());
        Ok(Delivery {
            file_name: trigger.file_name.clone(),
            location: None,
            bytes: trigger.blob.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(registry: &mut DownloadRegistry, name: &str, data: &[u8]) -> DownloadTrigger {
        let blob = Blob::new(data.to_vec(), "image/avif");
        DownloadTrigger {
            url: registry.create(blob.clone()),
            file_name: name.to_string(),
            mime_type: FORCE_DOWNLOAD_MIME_TYPE.to_string(),
            blob,
        }
    }

    #[test]
    fn test_registry_lifecycle() {
        let mut registry = DownloadRegistry::new();
        let url = registry.create(Blob::new(vec![1u8], "image/jpeg"));
        assert!(url.as_str().starts_with("blob:flip/"));
        assert_eq!(registry.live_count(), 1);
        assert!(registry.get(&url).is_some());

        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert_eq!(registry.live_count(), 0);
        assert!(registry.get(&url).is_none());
    }

    #[test]
    fn test_urls_are_unique() {
        let mut registry = DownloadRegistry::new();
        let a = registry.create(Blob::new(vec![], "image/jpeg"));
        let b = registry.create(Blob::new(vec![], "image/jpeg"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("nested");
        let mut registry = DownloadRegistry::new();
        let mut sink = DirectorySink::new(&out, false);

        let delivery = sink
            .dispatch(&trigger(&mut registry, "a.avif", b"abc"))
            .expect("dispatch");
        assert_eq!(delivery.file_name, "a.avif");
        assert_eq!(delivery.bytes, 3);
        assert_eq!(fs::read(out.join("a.avif")).expect("read"), b"abc");
    }

    #[test]
    fn test_directory_sink_keeps_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = DownloadRegistry::new();
        let mut sink = DirectorySink::new(dir.path(), false);

        sink.dispatch(&trigger(&mut registry, "a.avif", b"one"))
            .expect("first");
        let second = sink
            .dispatch(&trigger(&mut registry, "a.avif", b"two"))
            .expect("second");

        assert_eq!(second.file_name, "a-1.avif");
        assert_eq!(fs::read(dir.path().join("a.avif")).expect("read"), b"one");
    }

    #[test]
    fn test_directory_sink_overwrites_when_allowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut registry = DownloadRegistry::new();
        let mut sink = DirectorySink::new(dir.path(), true);

        sink.dispatch(&trigger(&mut registry, "a.avif", b"one"))
            .expect("first");
        sink.dispatch(&trigger(&mut registry, "a.avif", b"two"))
            .expect("second");
        assert_eq!(fs::read(dir.path().join("a.avif")).expect("read"), b"two");
    }

    #[test]
    fn test_directory_sink_reports_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").expect("write");

        let mut registry = DownloadRegistry::new();
        let mut sink = DirectorySink::new(blocker.join("sub"), false);
        let err = sink
            .dispatch(&trigger(&mut registry, "a.avif", b"abc"))
            .expect_err("parent is a file");
        assert!(matches!(err, SessionError::Download { .. }));
    }
}
