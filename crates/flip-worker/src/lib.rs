//! Background execution of transform requests for flipkit.
//!
//! This crate provides:
//! - The message protocol between the transform stage and the orchestrator
//! - A worker task that runs each request on the blocking pool
//! - An executor that posts to the worker or falls back to running inline

pub mod executor;
pub mod protocol;
pub mod runner;

pub use executor::TransformExecutor;
pub use protocol::{WorkerMessage, WorkerStatus};
pub use runner::TransformWorker;
