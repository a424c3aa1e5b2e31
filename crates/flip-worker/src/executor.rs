//! Transform executor: posts requests to the worker or runs them inline.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing;

use flip_core::Capabilities;
use flip_core::config::{ArchiveConfig, WorkerConfig};
use flip_convert::{TransformMetrics, TransformRequest, TransformResult, transform};

use crate::protocol::WorkerMessage;
use crate::runner::TransformWorker;

/// Run one request and report every message through `emit`.
///
/// Shared by the worker task and the inline path so both produce the same
/// message sequence.
pub fn execute_request<F>(
    request: &TransformRequest,
    archive: &ArchiveConfig,
    metrics: &TransformMetrics,
    mut emit: F,
) where
    F: FnMut(WorkerMessage),
{
    let request_id = request.request_id;
    let input_bytes: u64 = request.files.iter().map(|f| f.byte_length()).sum();
    metrics.record_started(input_bytes);

    let started = Instant::now();
    let result = transform(request, archive, |percent, index| {
        emit(WorkerMessage::Progress {
            request_id,
            percent,
            index,
        });
    });

    match &result {
        TransformResult::Single { blob, .. } | TransformResult::Archive { blob, .. } => {
            metrics.record_success(started.elapsed(), blob.len() as u64);
        }
        _ => metrics.record_failure(),
    }

    emit(WorkerMessage::from_result(request_id, result));
}

/// Dispatches requests to the background worker when one is available.
///
/// All messages, whichever path produced them, arrive on the single
/// receiver returned by [`TransformExecutor::new`].
#[derive(Debug)]
pub struct TransformExecutor {
    /// Background worker, if it could be started
    worker: Option<TransformWorker>,
    /// Sender used by the inline path
    messages: mpsc::UnboundedSender<WorkerMessage>,
    /// Archive settings applied to every request
    archive: ArchiveConfig,
    /// Shared metrics
    metrics: Arc<TransformMetrics>,
}

impl TransformExecutor {
    /// Create an executor, starting the worker if config and host allow.
    pub fn new(
        config: &WorkerConfig,
        archive: ArchiveConfig,
        capabilities: &Capabilities,
        metrics: Arc<TransformMetrics>,
    ) -> (Self, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = if !config.enabled {
            tracing::info!("Background worker disabled by configuration; running inline");
            None
        } else if !capabilities.has_worker_support {
            tracing::info!("Host lacks worker support; running inline");
            None
        } else {
            match TransformWorker::spawn(
                config.queue_capacity,
                archive.clone(),
                Arc::clone(&metrics),
                tx.clone(),
            ) {
                Ok(worker) => Some(worker),
                Err(e) => {
                    tracing::warn!("Falling back to inline execution: {}", e);
                    None
                }
            }
        };

        (
            Self {
                worker,
                messages: tx,
                archive,
                metrics,
            },
            rx,
        )
    }

    /// Whether requests go to the background worker.
    pub fn uses_worker(&self) -> bool {
        self.worker.as_ref().is_some_and(TransformWorker::is_running)
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &Arc<TransformMetrics> {
        &self.metrics
    }

    /// Submit a request. Worker failures fall back to inline execution and
    /// are never reported to the caller.
    pub async fn submit(&mut self, request: TransformRequest) {
        if let Some(worker) = &self.worker {
            match worker.post(request.clone()).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(
                        "Worker rejected request {}; running inline: {}",
                        request.request_id,
                        e
                    );
                    self.metrics.record_inline_fallback();
                    self.worker = None;
                }
            }
        }

        self.run_inline(&request);
    }

    fn run_inline(&self, request: &TransformRequest) {
        tracing::debug!("Running request {} inline", request.request_id);
        let out = &self.messages;
        execute_request(request, &self.archive, &self.metrics, |msg| {
            let _ = out.send(msg);
        });
    }

    /// Stop the background worker, if any.
    pub async fn shutdown(self) {
        if let Some(worker) = self.worker {
            worker.shutdown().await;
        }
    }
}
