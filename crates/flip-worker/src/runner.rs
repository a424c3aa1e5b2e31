//! Worker runner: a background task that executes transform requests.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing;

use flip_core::config::ArchiveConfig;
use flip_convert::{TransformError, TransformMetrics, TransformRequest};

use crate::executor::execute_request;
use crate::protocol::WorkerMessage;

/// Handle to the background transform task.
///
/// Requests are processed one at a time in arrival order. Each one runs on
/// the blocking pool so file reads and archive assembly never stall the
/// runtime. There is no cancellation: a superseded request runs to
/// completion and its messages are discarded by the receiver.
#[derive(Debug)]
pub struct TransformWorker {
    /// Request channel into the task
    requests: mpsc::Sender<TransformRequest>,
    /// Task handle, awaited on shutdown
    handle: JoinHandle<()>,
}

impl TransformWorker {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// Fails with `WorkerUnavailable` outside a runtime.
    pub fn spawn(
        queue_capacity: usize,
        archive: ArchiveConfig,
        metrics: Arc<TransformMetrics>,
        messages: mpsc::UnboundedSender<WorkerMessage>,
    ) -> Result<Self, TransformError> {
        let runtime = Handle::try_current().map_err(|e| TransformError::WorkerUnavailable {
            reason: e.to_string(),
        })?;

        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let handle = runtime.spawn(run_loop(rx, Arc::new(archive), metrics, messages));

        tracing::info!("Transform worker started with queue_capacity={}", queue_capacity);

        Ok(Self {
            requests: tx,
            handle,
        })
    }

    /// Post a request to the worker.
    pub async fn post(&self, request: TransformRequest) -> Result<(), TransformError> {
        let request_id = request.request_id;
        self.requests
            .send(request)
            .await
            .map_err(|_| TransformError::WorkerUnavailable {
                reason: "worker task has stopped".to_string(),
            })?;
        tracing::debug!("Posted request {} to worker", request_id);
        Ok(())
    }

    /// Whether the worker task is still accepting requests.
    pub fn is_running(&self) -> bool {
        !self.requests.is_closed() && !self.handle.is_finished()
    }

    /// Stop accepting requests and wait for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.requests);
        if let Err(e) = self.handle.await {
            tracing::error!("Transform worker ended abnormally: {}", e);
        }
        tracing::info!("Transform worker shut down");
    }
}

async fn run_loop(
    mut rx: mpsc::Receiver<TransformRequest>,
    archive: Arc<ArchiveConfig>,
    metrics: Arc<TransformMetrics>,
    messages: mpsc::UnboundedSender<WorkerMessage>,
) {
    while let Some(request) = rx.recv().await {
        let request_id = request.request_id;
        let archive = Arc::clone(&archive);
        let metrics = Arc::clone(&metrics);
        let out = messages.clone();

        tracing::info!(
            "Processing request {}: files={}, direction={}",
            request_id,
            request.expected_count,
            request.direction
        );

        let joined = tokio::task::spawn_blocking(move || {
            execute_request(&request, &archive, &metrics, |msg| {
                // Receiver gone means nobody is listening any more.
                let _ = out.send(msg);
            });
        })
        .await;

        if let Err(e) = joined {
            tracing::error!("Request {} panicked in worker: {}", request_id, e);
            let _ = messages.send(WorkerMessage::Error {
                request_id,
                message: "Conversion failed".to_string(),
            });
        }

        if messages.is_closed() {
            tracing::info!("Message receiver dropped; stopping worker");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use flip_convert::{InputFile, RequestId, TransformResult};
    use flip_core::types::{ConversionDirection, FormatPair};

    use super::*;
    use crate::protocol::WorkerStatus;

    fn request(id: u64, names: &[&str]) -> TransformRequest {
        let files: Arc<[InputFile]> = names
            .iter()
            .map(|n| InputFile::from_bytes(*n, vec![7u8; 16], "image/jpeg"))
            .collect::<Vec<_>>()
            .into();
        TransformRequest::new(
            RequestId(id),
            files,
            ConversionDirection::BToA,
            &FormatPair::default(),
        )
    }

    #[test]
    fn test_spawn_outside_runtime_is_unavailable() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = TransformWorker::spawn(4, ArchiveConfig::default(), Arc::default(), tx)
            .expect_err("no runtime");
        assert!(matches!(err, TransformError::WorkerUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_processes_requests_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = TransformWorker::spawn(4, ArchiveConfig::default(), Arc::default(), tx)
            .expect("spawn");

        worker.post(request(1, &["a.jpg"])).await.expect("post 1");
        worker
            .post(request(2, &["a.jpg", "b.jpg", "c.png"]))
            .await
            .expect("post 2");

        let mut terminals = Vec::new();
        while terminals.len() < 2 {
            let msg = rx.recv().await.expect("message");
            if msg.is_terminal() {
                terminals.push(msg);
            }
        }

        assert_eq!(terminals[0].request_id(), RequestId(1));
        assert_eq!(terminals[1].request_id(), RequestId(2));
        match &terminals[1] {
            WorkerMessage::Success {
                result: TransformResult::Archive { entry_names, .. },
                ..
            } => assert_eq!(entry_names.len(), 3),
            other => panic!("expected archive, got {other:?}"),
        }

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_progress_precedes_terminal() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = TransformWorker::spawn(1, ArchiveConfig::default(), Arc::default(), tx)
            .expect("spawn");

        let names: Vec<String> = (0..12).map(|i| format!("p{i}.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        worker.post(request(9, &refs)).await.expect("post");
        worker.shutdown().await;

        let mut statuses = Vec::new();
        let mut last_percent = 0;
        while let Some(msg) = rx.recv().await {
            if let WorkerMessage::Progress { percent, .. } = msg {
                assert!(percent >= last_percent);
                last_percent = percent;
            }
            statuses.push(msg.status());
        }

        assert_eq!(statuses.last(), Some(&WorkerStatus::Success));
        assert!(statuses[..statuses.len() - 1]
            .iter()
            .all(|s| *s == WorkerStatus::Progress));
    }
}
