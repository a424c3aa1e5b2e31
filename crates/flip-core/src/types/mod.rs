//! Core type definitions used across the flipkit workspace.

pub mod direction;
pub mod format;
pub mod size;

pub use direction::ConversionDirection;
pub use format::{FormatPair, ImageFormat};
pub use size::format_file_size;
