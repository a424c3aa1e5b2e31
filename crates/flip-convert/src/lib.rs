//! # flip-convert
//!
//! The conversion stages of flipkit: validating a dropped batch against
//! the active direction, relabeling each file's bytes with the target
//! format's MIME type and extension, and bundling multi-file batches into
//! a single zip archive.
//!
//! ## Byte pass-through
//!
//! No pixel data is decoded or re-encoded. A "converted" file carries the
//! input bytes unchanged under the target format's name and MIME type.
//! A real codec would slot in behind [`transform::transform`] without
//! changing any caller.

pub mod archive;
pub mod error;
pub mod filesystem;
pub mod intake;
pub mod metrics;
pub mod models;
pub mod transform;

pub use archive::ArchiveBuilder;
pub use error::{IntakeError, TransformError};
pub use intake::{ValidatedBatch, intake, is_accepted};
pub use metrics::TransformMetrics;
pub use models::{Blob, FileSource, InputFile, RequestId, TransformRequest, TransformResult};
pub use transform::transform;
