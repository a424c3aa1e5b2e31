//! # flip-session
//!
//! The conversion session: one state machine that takes a dropped batch
//! through `idle → ready → processing → success | error`, dispatches the
//! transform to the background worker (or inline), discards results from
//! superseded requests, and delivers exactly one forced download per
//! successful conversion.

pub mod download;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use download::{
    Delivery, DirectorySink, DownloadRegistry, DownloadSink, DownloadTrigger, DownloadUrl,
    MemorySink,
};
pub use error::SessionError;
pub use orchestrator::Orchestrator;
pub use state::{SessionState, SessionStatus};
