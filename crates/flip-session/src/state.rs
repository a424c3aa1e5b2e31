//! Session status and observable state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use flip_convert::InputFile;
use flip_core::types::ConversionDirection;

use crate::download::DownloadUrl;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nothing selected.
    #[default]
    Idle,
    /// A validated batch is waiting to be converted.
    Ready,
    /// A request is in flight.
    Processing,
    /// The last request produced a download.
    Success,
    /// The last request failed.
    Error,
}

impl SessionStatus {
    /// Whether a request can be started from this status.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Whether the last request has finished, either way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a view needs to render the session.
///
/// Only the orchestrator mutates it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(crate) status: SessionStatus,
    pub(crate) files: Option<Arc<[InputFile]>>,
    pub(crate) progress: u8,
    pub(crate) current_index: usize,
    pub(crate) last_download_url: Option<DownloadUrl>,
    pub(crate) last_download_name: Option<String>,
    pub(crate) error_message: Option<String>,
    pub(crate) direction: ConversionDirection,
}

impl SessionState {
    pub(crate) fn new(direction: ConversionDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The validated batch, if any.
    pub fn files(&self) -> &[InputFile] {
        self.files.as_deref().unwrap_or(&[])
    }

    /// Number of files in the batch.
    pub fn file_count(&self) -> usize {
        self.files().len()
    }

    /// Latest progress percent of the in-flight request.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// 1-based index of the last file reported by progress.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The live download URL, if a conversion succeeded.
    pub fn last_download_url(&self) -> Option<&DownloadUrl> {
        self.last_download_url.as_ref()
    }

    /// Name the live download was delivered under.
    pub fn last_download_name(&self) -> Option<&str> {
        self.last_download_name.as_deref()
    }

    /// Message shown after a rejected intake or a failed request.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Direction the next request will use.
    pub fn direction(&self) -> ConversionDirection {
        self.direction
    }

    pub(crate) fn clear_batch(&mut self) {
        self.files = None;
        self.progress = 0;
        self.current_index = 0;
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_allowed() {
        assert!(SessionStatus::Ready.can_start());
        assert!(SessionStatus::Error.can_start());
        assert!(!SessionStatus::Idle.can_start());
        assert!(!SessionStatus::Processing.can_start());
        assert!(!SessionStatus::Success.can_start());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Processing.to_string(), "processing");
        assert!(SessionStatus::Success.is_terminal());
        assert!(!SessionStatus::Ready.is_terminal());
    }

    #[test]
    fn test_new_state_is_idle() {
        let state = SessionState::new(ConversionDirection::BToA);
        assert_eq!(state.status(), SessionStatus::Idle);
        assert_eq!(state.file_count(), 0);
        assert_eq!(state.direction(), ConversionDirection::BToA);
        assert!(state.last_download_url().is_none());
    }
}
