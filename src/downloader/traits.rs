// Seams between the session, the engine and the presentation layer

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::errors::DownloadError;
use super::models::{
    DownloadPlan, DownloadRequest, EngineCapability, EngineProgress, ProgressEvent, SessionEvent,
};

/// Trait for download engine implementations
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Run one download to completion, reporting through `hooks`.
    async fn download(
        &self,
        request: &DownloadRequest,
        plan: &DownloadPlan,
        hooks: &mut (dyn EngineHooks + Send),
    ) -> Result<(), DownloadError>;
}

/// Callbacks the engine invokes while it runs: one progress hook plus a
/// three-level logger.
pub trait EngineHooks {
    fn progress(&mut self, update: &EngineProgress);
    fn debug(&mut self, message: &str);
    fn warning(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Detects what the engine can do in the current environment. Must not fail.
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self) -> EngineCapability;
}

/// Implemented by the presentation layer
pub trait EventSink {
    fn on_progress(&mut self, percent: u8);
    fn on_status(&mut self, message: &str);
    fn on_log(&mut self, line: &str);
    fn on_finished(&mut self);
    fn on_error(&mut self, message: &str);
    fn on_ready_to_open(&mut self, path: &Path);
}

/// Sending half of the worker -> foreground event queue
#[derive(Debug, Clone)]
pub struct ProgressEmitter {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ProgressEmitter {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn emit(&self, event: SessionEvent) {
        // The receiver is gone only when the session was dropped
        if self.tx.send(event).is_err() {
            tracing::trace!("session dropped, event discarded");
        }
    }

    pub fn progress(&self, event: ProgressEvent) {
        self.emit(SessionEvent::Progress(event));
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit(SessionEvent::Status(message.into()));
    }

    pub fn log(&self, line: impl Into<String>) {
        self.emit(SessionEvent::Log(line.into()));
    }
}
