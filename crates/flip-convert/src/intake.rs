//! File intake and validation.

use tracing::{debug, info};

use flip_core::types::{ConversionDirection, FormatPair};

use crate::error::IntakeError;
use crate::models::InputFile;

/// A batch that passed intake: at least one file, all with accepted names.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    files: Vec<InputFile>,
}

impl ValidatedBatch {
    /// Files in selection order.
    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    /// Number of files in the batch (never zero).
    pub fn count(&self) -> usize {
        self.files.len()
    }
}

/// Keep the files whose names carry a suffix accepted for `direction`.
///
/// Matching is case-insensitive on the trailing `.<suffix>`; selection
/// order is preserved.
pub fn intake(
    raw_selection: Vec<InputFile>,
    direction: ConversionDirection,
    formats: &FormatPair,
) -> Result<ValidatedBatch, IntakeError> {
    let suffixes = formats.accepted_suffixes(direction);
    let offered = raw_selection.len();

    let files: Vec<InputFile> = raw_selection
        .into_iter()
        .filter(|file| {
            let keep = matches_suffix(file.name(), &suffixes);
            if !keep {
                debug!(name = %file.name(), "Rejected file with unaccepted extension");
            }
            keep
        })
        .collect();

    if files.is_empty() {
        return Err(IntakeError::NoMatchingFiles {
            accepted: suffixes
                .iter()
                .map(|s| s.to_ascii_uppercase())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    info!(
        offered = offered,
        accepted = files.len(),
        direction = %direction,
        "Intake accepted batch"
    );

    Ok(ValidatedBatch { files })
}

/// Whether intake would keep a file called `name` for `direction`.
pub fn is_accepted(name: &str, direction: ConversionDirection, formats: &FormatPair) -> bool {
    matches_suffix(name, &formats.accepted_suffixes(direction))
}

fn matches_suffix(name: &str, suffixes: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    suffixes.iter().any(|suffix| {
        lower
            .strip_suffix(suffix)
            .is_some_and(|rest| rest.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::matches_suffix as has_accepted_suffix;

    fn file(name: &str) -> InputFile {
        InputFile::from_bytes(name, vec![0u8; 4], "application/octet-stream")
    }

    #[test]
    fn test_filters_by_direction_and_keeps_order() {
        let batch = intake(
            vec![file("b.PNG"), file("notes.txt"), file("a.jpeg"), file("c.avif")],
            ConversionDirection::BToA,
            &FormatPair::default(),
        )
        .expect("batch");

        let names: Vec<&str> = batch.files().iter().map(InputFile::name).collect();
        assert_eq!(names, vec!["b.PNG", "a.jpeg"]);
        assert_eq!(batch.count(), 2);
    }

    #[test]
    fn test_is_accepted_follows_direction() {
        let pair = FormatPair::default();
        assert!(is_accepted("Cat.PNG", ConversionDirection::BToA, &pair));
        assert!(!is_accepted("cat.png", ConversionDirection::AToB, &pair));
        assert!(is_accepted("cat.avif", ConversionDirection::AToB, &pair));
        assert!(!is_accepted("avif", ConversionDirection::AToB, &pair));
    }

    #[test]
    fn test_no_match_names_accepted_formats() {
        let err = intake(
            vec![file("a.jpg"), file("b.png")],
            ConversionDirection::AToB,
            &FormatPair::default(),
        )
        .expect_err("should reject");

        assert_eq!(
            err,
            IntakeError::NoMatchingFiles {
                accepted: "AVIF".to_string()
            }
        );
        assert_eq!(err.to_string(), "Please select image files (AVIF)");
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let err = intake(Vec::new(), ConversionDirection::BToA, &FormatPair::default())
            .expect_err("should reject");
        assert!(err.to_string().contains("JPG, JPEG, PNG"));
    }

    #[test]
    fn test_suffix_must_follow_a_dot() {
        assert!(!has_accepted_suffix("avif", &["avif"]));
        assert!(!has_accepted_suffix("photoavif", &["avif"]));
        assert!(has_accepted_suffix("photo.AVIF", &["avif"]));
    }
}
