//! Image formats and the format pair a site converts between.

use serde::{Deserialize, Serialize};

use super::direction::ConversionDirection;

/// Image formats known to the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// AV1 Image File Format
    Avif,
    /// JPEG
    Jpeg,
    /// Portable Network Graphics
    Png,
    /// WebP
    Webp,
}

impl ImageFormat {
    /// Every known format, in display order.
    pub const ALL: [ImageFormat; 4] = [Self::Avif, Self::Jpeg, Self::Png, Self::Webp];

    /// Canonical extension written on output files (no leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// MIME type attached to output blobs.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    /// File-name suffixes accepted as this format on intake.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Self::Avif => &["avif"],
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Webp => &["webp"],
        }
    }

    /// Short upper-case label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Avif => "AVIF",
            Self::Jpeg => "JPG",
            Self::Png => "PNG",
            Self::Webp => "WebP",
        }
    }

    /// Determine a format from a bare extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.suffixes().contains(&ext.as_str()))
    }

    /// Determine a format from a file name's trailing extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The two formats a site flips between.
///
/// `a_also_accepts` / `b_also_accepts` list extra input formats accepted
/// when that side is the conversion source (JPGFlip takes PNG alongside
/// JPG when producing AVIF).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatPair {
    /// First format of the pair.
    pub a: ImageFormat,
    /// Second format of the pair.
    pub b: ImageFormat,
    /// Extra source formats accepted for `a_to_b`.
    #[serde(default)]
    pub a_also_accepts: Vec<ImageFormat>,
    /// Extra source formats accepted for `b_to_a`.
    #[serde(default)]
    pub b_also_accepts: Vec<ImageFormat>,
}

impl Default for FormatPair {
    fn default() -> Self {
        Self {
            a: ImageFormat::Avif,
            b: ImageFormat::Jpeg,
            a_also_accepts: Vec::new(),
            b_also_accepts: vec![ImageFormat::Png],
        }
    }
}

impl FormatPair {
    /// Primary source format for a direction.
    pub fn source(&self, direction: ConversionDirection) -> ImageFormat {
        match direction {
            ConversionDirection::AToB => self.a,
            ConversionDirection::BToA => self.b,
        }
    }

    /// Target format for a direction.
    pub fn target(&self, direction: ConversionDirection) -> ImageFormat {
        match direction {
            ConversionDirection::AToB => self.b,
            ConversionDirection::BToA => self.a,
        }
    }

    /// All formats accepted as input for a direction, primary first.
    pub fn source_formats(&self, direction: ConversionDirection) -> Vec<ImageFormat> {
        let extra = match direction {
            ConversionDirection::AToB => &self.a_also_accepts,
            ConversionDirection::BToA => &self.b_also_accepts,
        };

        let mut formats = vec![self.source(direction)];
        for format in extra {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }
        formats
    }

    /// Accepted file-name suffixes for a direction, lower-case, no dot.
    pub fn accepted_suffixes(&self, direction: ConversionDirection) -> Vec<&'static str> {
        self.source_formats(direction)
            .iter()
            .flat_map(|format| format.suffixes().iter().copied())
            .collect()
    }

    /// Human-readable headline such as "Convert AVIF to JPG".
    pub fn describe(&self, direction: ConversionDirection) -> String {
        format!(
            "Convert {} to {}",
            self.source(direction).label(),
            self.target(direction).label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_accepts_both_suffixes() {
        assert_eq!(ImageFormat::from_extension("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension(".jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn test_from_file_name_uses_last_extension() {
        assert_eq!(
            ImageFormat::from_file_name("holiday.final.WebP"),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::from_file_name("README"), None);
    }

    #[test]
    fn test_default_pair_directions() {
        let pair = FormatPair::default();
        assert_eq!(pair.target(ConversionDirection::AToB), ImageFormat::Jpeg);
        assert_eq!(pair.target(ConversionDirection::BToA), ImageFormat::Avif);
        assert_eq!(
            pair.accepted_suffixes(ConversionDirection::BToA),
            vec!["jpg", "jpeg", "png"]
        );
        assert_eq!(pair.accepted_suffixes(ConversionDirection::AToB), vec!["avif"]);
    }

    #[test]
    fn test_source_formats_skip_duplicates() {
        let pair = FormatPair {
            a: ImageFormat::Webp,
            b: ImageFormat::Jpeg,
            a_also_accepts: vec![ImageFormat::Webp],
            b_also_accepts: vec![],
        };
        assert_eq!(
            pair.source_formats(ConversionDirection::AToB),
            vec![ImageFormat::Webp]
        );
    }

    #[test]
    fn test_describe_names_both_sides() {
        let pair = FormatPair::default();
        assert_eq!(
            pair.describe(ConversionDirection::BToA),
            "Convert JPG to AVIF"
        );
    }
}
