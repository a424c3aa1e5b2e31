//! Messages sent from the transform stage back to the orchestrator.

use serde::{Deserialize, Serialize};

use flip_convert::{RequestId, TransformResult};

/// Status tag carried by every worker message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    /// Intermediate batch progress.
    Progress,
    /// Terminal: output produced.
    Success,
    /// Terminal: request failed.
    Error,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progress => write!(f, "progress"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One message about a request.
///
/// Zero or more `Progress` messages precede exactly one `Success` or
/// `Error` for the same `request_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Batch progress.
    Progress {
        /// Request this message belongs to.
        request_id: RequestId,
        /// Percent complete, 0-100.
        percent: u8,
        /// 1-based index of the file just processed.
        index: usize,
    },
    /// The request produced a single file or archive.
    Success {
        /// Request this message belongs to.
        request_id: RequestId,
        /// `Single` or `Archive`.
        result: TransformResult,
    },
    /// The request failed.
    Error {
        /// Request this message belongs to.
        request_id: RequestId,
        /// User-readable reason.
        message: String,
    },
}

impl WorkerMessage {
    /// Wrap a transform result for `request_id`.
    pub fn from_result(request_id: RequestId, result: TransformResult) -> Self {
        match result {
            TransformResult::Progress {
                percent,
                current_index,
            } => Self::Progress {
                request_id,
                percent,
                index: current_index,
            },
            TransformResult::Failure { message } => Self::Error {
                request_id,
                message,
            },
            result => Self::Success { request_id, result },
        }
    }

    /// The request this message belongs to.
    pub fn request_id(&self) -> RequestId {
        match self {
            Self::Progress { request_id, .. }
            | Self::Success { request_id, .. }
            | Self::Error { request_id, .. } => *request_id,
        }
    }

    /// The status tag.
    pub fn status(&self) -> WorkerStatus {
        match self {
            Self::Progress { .. } => WorkerStatus::Progress,
            Self::Success { .. } => WorkerStatus::Success,
            Self::Error { .. } => WorkerStatus::Error,
        }
    }

    /// Whether this message ends its request.
    pub fn is_terminal(&self) -> bool {
        self.status() != WorkerStatus::Progress
    }
}

#[cfg(test)]
mod tests {
    use flip_convert::Blob;

    use super::*;

    #[test]
    fn test_failure_maps_to_error_status() {
        let msg = WorkerMessage::from_result(
            RequestId(2),
            TransformResult::Failure {
                message: "bad".into(),
            },
        );
        assert_eq!(msg.status(), WorkerStatus::Error);
        assert_eq!(msg.request_id(), RequestId(2));
        assert!(msg.is_terminal());
    }

    #[test]
    fn test_single_maps_to_success() {
        let msg = WorkerMessage::from_result(
            RequestId(5),
            TransformResult::Single {
                blob: Blob::new(vec![1u8], "image/avif"),
                mime_type: "image/avif".into(),
                suggested_name: "a.avif".into(),
            },
        );
        assert_eq!(msg.status(), WorkerStatus::Success);
        assert_eq!(msg.status().to_string(), "success");
    }

    #[test]
    fn test_progress_keeps_index() {
        let msg = WorkerMessage::from_result(
            RequestId(1),
            TransformResult::Progress {
                percent: 40,
                current_index: 4,
            },
        );
        assert_eq!(
            msg,
            WorkerMessage::Progress {
                request_id: RequestId(1),
                percent: 40,
                index: 4
            }
        );
        assert!(!msg.is_terminal());
    }
}
