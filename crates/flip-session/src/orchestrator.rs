//! The conversion session state machine.
//!
//! ```text
//! idle --intake--> ready --start--> processing --success--> success
//!                                       |                      |
//!                                       +--failure--> error    |
//!                                                      |       |
//!             error --retry--> processing              |       |
//!             success | error --reset--> idle <--------+-------+
//! ```
//!
//! Every request carries an id. Messages for any id other than the
//! current one are dropped, so a late result from a superseded request
//! never touches the session.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use flip_convert::{
    InputFile, RequestId, TransformMetrics, TransformRequest, TransformResult, intake,
};
use flip_core::Capabilities;
use flip_core::config::AppConfig;
use flip_core::config::SiteConfig;
use flip_core::types::ConversionDirection;
use flip_worker::{TransformExecutor, WorkerMessage};

use crate::download::{
    Delivery, DownloadRegistry, DownloadSink, DownloadTrigger, FORCE_DOWNLOAD_MIME_TYPE,
};
use crate::error::SessionError;
use crate::state::{SessionState, SessionStatus};

/// Message recorded when the worker disappears mid-request.
const WORKER_LOST_MESSAGE: &str = "Conversion failed - worker stopped";

/// Drives one conversion session.
#[derive(Debug)]
pub struct Orchestrator<S: DownloadSink> {
    site: SiteConfig,
    state: SessionState,
    last_issued: RequestId,
    in_flight: Option<RequestId>,
    executor: TransformExecutor,
    messages: mpsc::UnboundedReceiver<WorkerMessage>,
    registry: DownloadRegistry,
    sink: S,
    metrics: Arc<TransformMetrics>,
}

impl<S: DownloadSink> Orchestrator<S> {
    /// Build a session from configuration.
    ///
    /// The background worker is started when the config enables it, the
    /// host supports it, and a tokio runtime is running; otherwise
    /// requests run inline.
    pub fn new(config: &AppConfig, capabilities: &Capabilities, sink: S) -> Self {
        let metrics = Arc::new(TransformMetrics::new());
        let (executor, messages) = TransformExecutor::new(
            &config.worker,
            config.archive.clone(),
            capabilities,
            Arc::clone(&metrics),
        );

        info!(
            site = %config.site.name,
            direction = %config.site.default_direction,
            worker = executor.uses_worker(),
            "Session created"
        );

        Self {
            site: config.site.clone(),
            state: SessionState::new(config.site.default_direction),
            last_issued: RequestId(0),
            in_flight: None,
            executor,
            messages,
            registry: DownloadRegistry::new(),
            sink,
            metrics,
        }
    }

    /// Observable state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Site the session was built for.
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Download URL registry.
    pub fn registry(&self) -> &DownloadRegistry {
        &self.registry
    }

    /// Download sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Shared transform metrics.
    pub fn metrics(&self) -> &Arc<TransformMetrics> {
        &self.metrics
    }

    /// Whether requests go to the background worker.
    pub fn uses_worker(&self) -> bool {
        self.executor.uses_worker()
    }

    /// Id of the request whose messages are currently accepted.
    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Accept a new selection.
    ///
    /// Any live download is revoked and any in-flight request superseded.
    /// On success the session is `ready` with the filtered batch; when
    /// nothing matches it returns to `idle` with the message recorded.
    pub fn intake(&mut self, files: Vec<InputFile>) -> Result<usize, SessionError> {
        self.revoke_download();
        self.supersede();
        self.state.clear_batch();

        match intake(files, self.state.direction, &self.site.formats) {
            Ok(batch) => {
                let count = batch.count();
                self.state.files = Some(batch.files().to_vec().into());
                self.state.status = SessionStatus::Ready;
                info!(files = count, "Session ready");
                Ok(count)
            }
            Err(e) => {
                self.state.status = SessionStatus::Idle;
                self.state.error_message = Some(e.to_string());
                info!(reason = %e, "Selection rejected");
                Err(e.into())
            }
        }
    }

    /// Start converting the current batch.
    ///
    /// Valid from `ready` and `error`. While `processing` this is a no-op
    /// returning `None`.
    pub async fn start(&mut self) -> Result<Option<RequestId>, SessionError> {
        match self.state.status {
            SessionStatus::Processing => {
                debug!("Start ignored; a request is already in flight");
                return Ok(None);
            }
            status if !status.can_start() => {
                return Err(match self.state.files {
                    None => SessionError::NoBatch,
                    Some(_) => SessionError::InvalidTransition {
                        action: "start",
                        status,
                    },
                });
            }
            _ => {}
        }

        let files = self.state.files.clone().ok_or(SessionError::NoBatch)?;

        self.last_issued = self.last_issued.next();
        let request_id = self.last_issued;
        let request =
            TransformRequest::new(request_id, files, self.state.direction, &self.site.formats);

        self.in_flight = Some(request_id);
        self.state.status = SessionStatus::Processing;
        self.state.progress = 0;
        self.state.current_index = 0;
        self.state.error_message = None;

        info!(
            request_id = %request_id,
            files = request.expected_count,
            direction = %request.direction,
            target = %request.target,
            "Conversion started"
        );

        self.executor.submit(request).await;
        Ok(Some(request_id))
    }

    /// Re-run the batch after a failure.
    pub async fn retry(&mut self) -> Result<Option<RequestId>, SessionError> {
        if self.state.status != SessionStatus::Error {
            return Err(SessionError::InvalidTransition {
                action: "retry",
                status: self.state.status,
            });
        }
        self.start().await
    }

    /// Apply one worker message. Returns whether it was accepted.
    pub fn handle_message(&mut self, message: WorkerMessage) -> bool {
        let request_id = message.request_id();
        if self.in_flight != Some(request_id) {
            self.metrics.record_stale();
            warn!(
                request_id = %request_id,
                status = %message.status(),
                "Discarded message from superseded request"
            );
            return false;
        }

        match message {
            WorkerMessage::Progress { percent, index, .. } => {
                self.state.progress = self.state.progress.max(percent.min(100));
                self.state.current_index = index;
                debug!(request_id = %request_id, percent, index, "Progress");
            }
            WorkerMessage::Success { result, .. } => {
                self.in_flight = None;
                self.complete(request_id, result);
            }
            WorkerMessage::Error { message, .. } => {
                self.in_flight = None;
                warn!(request_id = %request_id, error = %message, "Conversion failed");
                self.fail(message);
            }
        }
        true
    }

    /// Apply every message already waiting, without blocking.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.messages.try_recv() {
            if self.handle_message(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the in-flight request (if any) has finished.
    pub async fn settle(&mut self) -> SessionStatus {
        while self.state.status == SessionStatus::Processing {
            match self.messages.recv().await {
                Some(message) => {
                    self.handle_message(message);
                }
                None => {
                    warn!("Message channel closed with a request in flight");
                    self.in_flight = None;
                    self.fail(WORKER_LOST_MESSAGE.to_string());
                }
            }
        }
        self.state.status
    }

    /// Return to `idle`, releasing the download and dropping the batch.
    ///
    /// Valid from any status and idempotent.
    pub fn reset(&mut self) {
        self.revoke_download();
        self.supersede();
        self.state.clear_batch();
        self.state.status = SessionStatus::Idle;
        debug!("Session reset");
    }

    /// Flip the conversion direction. Returns the new direction.
    pub fn toggle_direction(&mut self) -> ConversionDirection {
        let next = self.state.direction.toggled();
        self.set_direction(next);
        next
    }

    /// Select the direction used by the next request.
    pub fn set_direction(&mut self, direction: ConversionDirection) {
        if self.state.direction != direction {
            self.state.direction = direction;
            info!(
                direction = %direction,
                mode = %self.site.formats.describe(direction),
                "Direction changed"
            );
        }
    }

    /// Deliver the last output again under the same name.
    pub fn redownload(&mut self) -> Result<Delivery, SessionError> {
        let invalid = SessionError::InvalidTransition {
            action: "download again",
            status: self.state.status,
        };
        if self.state.status != SessionStatus::Success {
            return Err(invalid);
        }

        let (Some(url), Some(name)) = (
            self.state.last_download_url.clone(),
            self.state.last_download_name.clone(),
        ) else {
            return Err(invalid);
        };
        let Some(blob) = self.registry.get(&url).cloned() else {
            return Err(invalid);
        };

        let trigger = DownloadTrigger {
            mime_type: forcing_mime_type(&blob.mime_type),
            url,
            file_name: name,
            blob,
        };
        self.sink.dispatch(&trigger)
    }

    /// Stop the background worker.
    pub async fn shutdown(mut self) {
        self.reset();
        self.executor.shutdown().await;
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn complete(&mut self, request_id: RequestId, result: TransformResult) {
        let (blob, suggested_name) = match result {
            TransformResult::Single {
                blob,
                suggested_name,
                ..
            } => (blob, suggested_name),
            TransformResult::Archive {
                blob,
                suggested_name,
                ..
            } => (blob, suggested_name),
            other => {
                warn!(request_id = %request_id, result = ?other, "Unexpected terminal result");
                self.fail("Conversion failed - invalid result".to_string());
                return;
            }
        };

        self.revoke_download();
        let url = self.registry.create(blob.clone());
        let trigger = DownloadTrigger {
            url: url.clone(),
            file_name: suggested_name.clone(),
            mime_type: forcing_mime_type(&blob.mime_type),
            blob,
        };

        match self.sink.dispatch(&trigger) {
            Ok(delivery) => {
                self.state.last_download_url = Some(url);
                self.state.last_download_name = Some(suggested_name);
                self.state.progress = 100;
                self.state.error_message = None;
                self.state.status = SessionStatus::Success;
                info!(
                    request_id = %request_id,
                    file = %delivery.file_name,
                    bytes = delivery.bytes,
                    "Conversion delivered"
                );
            }
            Err(e) => {
                self.registry.revoke(&url);
                warn!(request_id = %request_id, error = %e, "Download failed");
                self.fail(e.to_string());
            }
        }
    }

    fn fail(&mut self, message: String) {
        self.state.status = SessionStatus::Error;
        self.state.error_message = Some(message);
    }

    fn supersede(&mut self) {
        if let Some(id) = self.in_flight.take() {
            debug!(request_id = %id, "Superseded in-flight request");
        }
    }

    fn revoke_download(&mut self) {
        if let Some(url) = self.state.last_download_url.take() {
            self.registry.revoke(&url);
        }
        self.state.last_download_name = None;
    }
}

/// Archives keep their own type; single files are forced to a save.
fn forcing_mime_type(blob_mime: &str) -> String {
    if blob_mime == flip_convert::archive::ARCHIVE_MIME_TYPE {
        blob_mime.to_string()
    } else {
        FORCE_DOWNLOAD_MIME_TYPE.to_string()
    }
}
