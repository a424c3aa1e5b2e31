//! The byte transform stage.
//!
//! One function serves both the background worker and the inline path:
//! read every file, relabel it under the target format, and either hand
//! back the single result or bundle the batch into an archive.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use flip_core::config::ArchiveConfig;
use flip_core::types::ImageFormat;

use crate::archive::{ArchiveBuilder, plan_entries};
use crate::error::TransformError;
use crate::models::{Blob, TransformRequest, TransformResult};

/// Extensions replaced when naming an output file.
const KNOWN_EXTENSIONS: &[&str] = &["avif", "png", "jpg", "jpeg", "webp"];

/// Run one request to completion.
///
/// `on_progress(percent, index)` is called for batches only, never after
/// the returned terminal result is produced. Errors never escape: they
/// become `TransformResult::Failure`.
#[instrument(
    skip(request, archive, on_progress),
    fields(request_id = %request.request_id, files = request.expected_count, target = %request.target)
)]
pub fn transform<F>(
    request: &TransformRequest,
    archive: &ArchiveConfig,
    on_progress: F,
) -> TransformResult
where
    F: FnMut(u8, usize),
{
    let started = Instant::now();
    match run(request, archive, on_progress) {
        Ok(result) => {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Transform complete"
            );
            result
        }
        Err(e) => {
            warn!(error = %e, "Transform failed");
            TransformResult::Failure {
                message: e.to_string(),
            }
        }
    }
}

fn run<F>(
    request: &TransformRequest,
    archive: &ArchiveConfig,
    mut on_progress: F,
) -> Result<TransformResult, TransformError>
where
    F: FnMut(u8, usize),
{
    let files = &request.files;
    if files.is_empty() {
        return Err(TransformError::InvalidRequest {
            reason: "no files to convert".to_string(),
        });
    }
    if files.len() != request.expected_count {
        return Err(TransformError::InvalidRequest {
            reason: format!(
                "expected {} files, received {}",
                request.expected_count,
                files.len()
            ),
        });
    }

    let target = request.target;

    if request.is_single() {
        let file = &files[0];
        let bytes = file.read_bytes()?;
        let suggested_name = output_name(file.name(), target);
        debug!(input = %file.name(), output = %suggested_name, "Relabeled single file");
        return Ok(TransformResult::Single {
            blob: Blob::new(bytes, target.mime_type()),
            mime_type: target.mime_type().to_string(),
            suggested_name,
        });
    }

    let total = files.len();
    let step = progress_step(total);
    let names: Vec<String> = files
        .iter()
        .map(|f| output_name(f.name(), target))
        .collect();
    let plan = plan_entries(&names);
    let entry_count = plan.iter().flatten().count();

    let mut builder = ArchiveBuilder::new(archive, entry_count);

    for (index, slot) in plan.iter().enumerate() {
        match slot {
            Some(source) => {
                let bytes = files[*source].read_bytes()?;
                builder.add_entry(&names[*source], &bytes)?;
            }
            None => {
                debug!(input = %files[index].name(), "Duplicate output name, entry already placed");
            }
        }

        if index % step == 0 {
            on_progress(progress_percent(index, total), index + 1);
        }
    }

    let (blob, entry_names) = builder.finish()?;
    Ok(TransformResult::Archive {
        blob,
        suggested_name: archive.file_name.clone(),
        entry_names,
    })
}

/// Output name: a known image extension is swapped for the target's,
/// anything else gets the target extension appended.
pub fn output_name(original: &str, target: ImageFormat) -> String {
    let base = strip_known_extension(original);
    format!("{}.{}", base, target.extension())
}

fn strip_known_extension(name: &str) -> &str {
    if let Some((base, ext)) = name.rsplit_once('.') {
        if KNOWN_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        {
            return base;
        }
    }
    name
}

/// Files between progress reports: roughly every tenth of the batch.
pub fn progress_step(total: usize) -> usize {
    (total / 10).max(1)
}

/// Rounded percentage after processing the file at zero-based `index`.
pub fn progress_percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = (index + 1).min(total);
    ((done * 200 + total) / (total * 2)) as u8
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::sync::Arc;

    use flip_core::types::{ConversionDirection, FormatPair};

    use super::*;
    use crate::models::{InputFile, RequestId};

    fn request(names: &[&str], direction: ConversionDirection) -> TransformRequest {
        let files: Arc<[InputFile]> = names
            .iter()
            .map(|n| InputFile::from_bytes(*n, n.as_bytes().to_vec(), "image/jpeg"))
            .collect::<Vec<_>>()
            .into();
        TransformRequest::new(RequestId(1), files, direction, &FormatPair::default())
    }

    fn entries(result: &TransformResult) -> Vec<(String, Vec<u8>)> {
        let blob = result.blob().expect("blob");
        let mut zip = zip::ZipArchive::new(Cursor::new(blob.bytes.to_vec())).expect("zip");
        (0..zip.len())
            .map(|i| {
                let mut entry = zip.by_index(i).expect("entry");
                let mut buf = Vec::new();
                entry.read_to_end(&mut buf).expect("read");
                (entry.name().to_string(), buf)
            })
            .collect()
    }

    #[test]
    fn test_single_file_is_relabeled() {
        let req = request(&["a.jpg"], ConversionDirection::BToA);
        let result = transform(&req, &ArchiveConfig::default(), |_, _| {
            panic!("single files report no progress")
        });

        match result {
            TransformResult::Single {
                blob,
                mime_type,
                suggested_name,
            } => {
                assert_eq!(suggested_name, "a.avif");
                assert_eq!(mime_type, "image/avif");
                assert_eq!(blob.mime_type, "image/avif");
                assert_eq!(blob.bytes.as_ref(), b"a.jpg");
            }
            other => panic!("expected Single, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_becomes_archive_in_order() {
        let req = request(&["a.jpg", "b.png"], ConversionDirection::BToA);
        let result = transform(&req, &ArchiveConfig::default(), |_, _| {});

        assert_eq!(result.suggested_name(), Some("converted_images.zip"));
        let entries = entries(&result);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a.avif".to_string(), b"a.jpg".to_vec()));
        assert_eq!(entries[1], ("b.avif".to_string(), b"b.png".to_vec()));
    }

    #[test]
    fn test_reverse_direction_targets_jpeg() {
        let req = request(&["photo.AVIF"], ConversionDirection::AToB);
        let result = transform(&req, &ArchiveConfig::default(), |_, _| {});
        assert_eq!(result.suggested_name(), Some("photo.jpg"));
    }

    #[test]
    fn test_progress_is_non_decreasing_and_one_based() {
        let names: Vec<String> = (0..25).map(|i| format!("f{i}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let req = request(&refs, ConversionDirection::BToA);

        let mut seen = Vec::new();
        let result = transform(&req, &ArchiveConfig::default(), |percent, index| {
            seen.push((percent, index))
        });

        assert!(matches!(result, TransformResult::Archive { .. }));
        assert_eq!(seen.first(), Some(&(4, 1)));
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0 && w[0].1 < w[1].1));
        // step = 2 for 25 files
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn test_duplicate_output_names_keep_last_content() {
        let files: Arc<[InputFile]> = vec![
            InputFile::from_bytes("a.jpg", b"first".to_vec(), "image/jpeg"),
            InputFile::from_bytes("a.png", b"second".to_vec(), "image/png"),
        ]
        .into();
        let req = TransformRequest::new(
            RequestId(3),
            files,
            ConversionDirection::BToA,
            &FormatPair::default(),
        );

        let result = transform(&req, &ArchiveConfig::default(), |_, _| {});
        let entries = entries(&result);
        assert_eq!(entries, vec![("a.avif".to_string(), b"second".to_vec())]);
    }

    #[test]
    fn test_duplicate_entry_stays_at_first_position() {
        let files: Arc<[InputFile]> = vec![
            InputFile::from_bytes("a.jpg", b"first".to_vec(), "image/jpeg"),
            InputFile::from_bytes("b.jpg", b"middle".to_vec(), "image/jpeg"),
            InputFile::from_bytes("a.png", b"last".to_vec(), "image/png"),
        ]
        .into();
        let req = TransformRequest::new(
            RequestId(5),
            files,
            ConversionDirection::BToA,
            &FormatPair::default(),
        );

        let mut seen = Vec::new();
        let result = transform(&req, &ArchiveConfig::default(), |percent, index| {
            seen.push((percent, index))
        });
        assert_eq!(
            entries(&result),
            vec![
                ("a.avif".to_string(), b"last".to_vec()),
                ("b.avif".to_string(), b"middle".to_vec()),
            ]
        );
        assert_eq!(seen.last(), Some(&(100, 3)));
    }

    #[test]
    fn test_unreadable_file_fails_whole_batch() {
        let files: Arc<[InputFile]> = vec![
            InputFile::from_bytes("a.jpg", b"ok".to_vec(), "image/jpeg"),
            InputFile::from_path("b.jpg", "/nonexistent/b.jpg", 2, "image/jpeg"),
        ]
        .into();
        let req = TransformRequest::new(
            RequestId(4),
            files,
            ConversionDirection::BToA,
            &FormatPair::default(),
        );

        match transform(&req, &ArchiveConfig::default(), |_, _| {}) {
            TransformResult::Failure { message } => assert!(message.contains("b.jpg")),
            other => panic!("expected Failure, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_count_is_rejected() {
        let mut req = request(&["a.jpg", "b.jpg"], ConversionDirection::BToA);
        req.expected_count = 3;
        let result = transform(&req, &ArchiveConfig::default(), |_, _| {});
        assert!(matches!(result, TransformResult::Failure { .. }));
    }

    #[test]
    fn test_output_name_rules() {
        assert_eq!(output_name("a.jpeg", ImageFormat::Avif), "a.avif");
        assert_eq!(output_name("A.JPG", ImageFormat::Avif), "A.avif");
        assert_eq!(output_name("archive.tar.png", ImageFormat::Jpeg), "archive.tar.jpg");
        assert_eq!(output_name("README", ImageFormat::Jpeg), "README.jpg");
        assert_eq!(output_name("notes.txt", ImageFormat::Avif), "notes.txt.avif");
    }

    #[test]
    fn test_percent_rounds_half_up() {
        assert_eq!(progress_percent(0, 8), 13);
        assert_eq!(progress_percent(0, 3), 33);
        assert_eq!(progress_percent(1, 3), 67);
        assert_eq!(progress_percent(2, 3), 100);
        assert_eq!(progress_step(9), 1);
        assert_eq!(progress_step(25), 2);
    }
}
