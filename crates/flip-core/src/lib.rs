//! # flip-core
//!
//! Core crate for flipkit. Contains configuration schemas, the image
//! format and conversion-direction types, the host capability probe,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other flipkit crates.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use capabilities::Capabilities;
pub use error::AppError;
pub use result::AppResult;
pub use types::{ConversionDirection, FormatPair, ImageFormat};
