//! Conversion direction.

use serde::{Deserialize, Serialize};

/// Which side of the site's [`FormatPair`](super::FormatPair) is the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDirection {
    /// Convert format `a` into format `b`.
    #[default]
    AToB,
    /// Convert format `b` into format `a`.
    BToA,
}

impl ConversionDirection {
    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            Self::AToB => Self::BToA,
            Self::BToA => Self::AToB,
        }
    }
}

impl std::fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AToB => write!(f, "a_to_b"),
            Self::BToA => write!(f, "b_to_a"),
        }
    }
}
