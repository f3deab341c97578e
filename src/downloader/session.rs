// DownloadSession - one download request, one background worker, one event stream
//
// Idle -> Running -> Completed | Failed
//
// `submit` validates synchronously and spawns the worker. The foreground then
// pulls events with `next_event` (or `drive` with an EventSink) until the
// worker has been joined; only then is the session no longer busy.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::adapter::EngineAdapter;
use super::errors::DownloadError;
use super::models::{DownloadRequest, EngineCapability, ProgressEvent, SessionEvent};
use super::planner::DownloadPlanner;
use super::traits::{CapabilityProbe, DownloadEngine, EventSink, ProgressEmitter};

pub const STATUS_STARTING: &str = "Starting download...";
pub const STATUS_FAILED: &str = "Download failed";
pub const STATUS_DONE: &str = "Done";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

pub struct DownloadSession {
    engine: Arc<dyn DownloadEngine>,
    probe: Arc<dyn CapabilityProbe>,
    state: SessionState,
    request: Option<DownloadRequest>,
    worker: Option<JoinHandle<()>>,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl DownloadSession {
    pub fn new(engine: Arc<dyn DownloadEngine>, probe: Arc<dyn CapabilityProbe>) -> Self {
        Self {
            engine,
            probe,
            state: SessionState::Idle,
            request: None,
            worker: None,
            events: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True until the worker of the last submission has been joined
    pub fn is_busy(&self) -> bool {
        self.worker.is_some()
    }

    pub fn request(&self) -> Option<&DownloadRequest> {
        self.request.as_ref()
    }

    /// Validate and start a download. Must be called inside a tokio runtime.
    ///
    /// Validation errors leave the session untouched and start nothing.
    pub fn submit(&mut self, url: &str, destination_folder: &str) -> Result<(), DownloadError> {
        if self.is_busy() {
            return Err(DownloadError::SessionBusy);
        }

        let request = DownloadRequest::new(url, destination_folder)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let emitter = ProgressEmitter::new(tx);

        let adapter = EngineAdapter::new(Arc::clone(&self.engine));
        let probe = Arc::clone(&self.probe);
        let worker_request = request.clone();

        tracing::info!(url = request.url(), destination = %request.destination().display(), "download submitted");

        let worker = tokio::spawn(async move {
            emitter.status(STATUS_STARTING);
            emitter.log(format!("Starting download: {}", worker_request.url()));

            // Probe re-runs per session; the environment may have changed
            let capability = tokio::task::spawn_blocking(move || probe.probe())
                .await
                .unwrap_or(EngineCapability::Degraded);
            match capability {
                EngineCapability::Full => {
                    emitter.log("ffmpeg detected, downloading separate video and audio streams...")
                }
                EngineCapability::Degraded => {
                    emitter.log("ffmpeg not found, using compatibility mode...")
                }
            }

            let plan = DownloadPlanner::plan(capability);
            adapter.start(&worker_request, &plan, &emitter).await;
        });

        self.request = Some(request);
        self.worker = Some(worker);
        self.events = Some(rx);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Next event from the worker, in emission order.
    ///
    /// Returns None once the worker has finished and been joined. If the
    /// worker ended without a terminal event, a `Failed` event is produced.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let received = match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => return None,
        };

        if let Some(event) = received {
            if let SessionEvent::Progress(progress) = &event {
                self.observe(progress);
            }
            return Some(event);
        }

        // Channel closed: the worker dropped its emitter
        self.events = None;
        let joined = self.retire_worker().await;

        if !self.state.is_terminal() {
            let message = match joined {
                Err(e) => e.to_string(),
                Ok(()) => "Download worker stopped without a result".to_string(),
            };
            tracing::error!(%message, "worker ended without a terminal event");
            self.state = SessionState::Failed;
            return Some(SessionEvent::Progress(ProgressEvent::Failed { message }));
        }

        None
    }

    /// Pump every event into `sink` until the worker is joined.
    pub async fn drive(&mut self, sink: &mut dyn EventSink) -> SessionState {
        while let Some(event) = self.next_event().await {
            self.dispatch(event, sink);
        }
        self.state
    }

    /// `submit` followed by `drive`.
    pub async fn run(
        &mut self,
        url: &str,
        destination_folder: &str,
        sink: &mut dyn EventSink,
    ) -> Result<SessionState, DownloadError> {
        self.submit(url, destination_folder)?;
        Ok(self.drive(sink).await)
    }

    /// The first terminal event settles the state.
    fn observe(&mut self, progress: &ProgressEvent) {
        if self.state.is_terminal() {
            if progress.is_terminal() {
                tracing::warn!(?progress, state = ?self.state, "terminal event after the session settled");
            }
            return;
        }
        match progress {
            ProgressEvent::Finished => self.state = SessionState::Completed,
            ProgressEvent::Failed { .. } => self.state = SessionState::Failed,
            ProgressEvent::Downloading { .. } | ProgressEvent::Merging => {}
        }
    }

    async fn retire_worker(&mut self) -> Result<(), DownloadError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        worker
            .await
            .map_err(|e| DownloadError::ExecutionError(format!("download worker failed: {}", e)))
    }

    fn dispatch(&self, event: SessionEvent, sink: &mut dyn EventSink) {
        match event {
            SessionEvent::Progress(ProgressEvent::Downloading { percent }) => sink.on_progress(percent),
            // the adapter already sent the status text
            SessionEvent::Progress(ProgressEvent::Merging) => {}
            SessionEvent::Progress(ProgressEvent::Finished) => {
                if let Some(request) = &self.request {
                    sink.on_ready_to_open(request.destination());
                }
                sink.on_finished();
                sink.on_status(STATUS_DONE);
            }
            SessionEvent::Progress(ProgressEvent::Failed { message }) => {
                sink.on_status(STATUS_FAILED);
                sink.on_log(&format!("ERROR: {}", message));
                sink.on_error(&message);
            }
            SessionEvent::Status(message) => sink.on_status(&message),
            SessionEvent::Log(line) => sink.on_log(&line),
        }
    }
}
