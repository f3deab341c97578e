// EngineAdapter - turns engine callbacks into the normalized event stream

use std::sync::Arc;

use super::models::{DownloadPlan, DownloadRequest, EngineProgress, EngineStatus, ProgressEvent};
use super::traits::{DownloadEngine, EngineHooks, ProgressEmitter};

pub const STATUS_MERGING: &str = "Merging audio and video...";
pub const STATUS_COMPLETE: &str = "Download complete!";
pub const LOG_SUCCESS: &str = "Download succeeded!";

/// Hook implementation handed to the engine for one run
struct HookTranslator<'a> {
    emitter: &'a ProgressEmitter,
}

impl EngineHooks for HookTranslator<'_> {
    fn progress(&mut self, update: &EngineProgress) {
        match update.status {
            EngineStatus::Downloading => {
                let percent = update.percent();
                self.emitter.progress(ProgressEvent::Downloading { percent });
                self.emitter.status(format!("Downloading: {}%", percent));
            }
            // one stream done; merge/post-processing follows
            EngineStatus::Finished => {
                self.emitter.progress(ProgressEvent::Merging);
                self.emitter.status(STATUS_MERGING);
                self.emitter.log(STATUS_MERGING);
            }
            EngineStatus::Error | EngineStatus::Other => {}
        }
    }

    fn debug(&mut self, message: &str) {
        self.emitter.log(message);
    }

    fn warning(&mut self, message: &str) {
        self.emitter.log(format!("WARNING: {}", message));
    }

    fn error(&mut self, message: &str) {
        self.emitter.log(format!("ERROR: {}", message));
    }
}

pub struct EngineAdapter {
    engine: Arc<dyn DownloadEngine>,
}

impl EngineAdapter {
    pub fn new(engine: Arc<dyn DownloadEngine>) -> Self {
        Self { engine }
    }

    /// Run the engine once. Emits exactly one of `Finished` or `Failed`.
    pub async fn start(&self, request: &DownloadRequest, plan: &DownloadPlan, emitter: &ProgressEmitter) {
        let mut hooks = HookTranslator { emitter };

        tracing::info!(engine = self.engine.name(), url = request.url(), capability = plan.capability.as_str(), "engine started");

        match self.engine.download(request, plan, &mut hooks).await {
            Ok(()) => {
                tracing::info!(engine = self.engine.name(), "engine finished");
                emitter.progress(ProgressEvent::Downloading { percent: 100 });
                emitter.status(STATUS_COMPLETE);
                emitter.log(LOG_SUCCESS);
                emitter.progress(ProgressEvent::Finished);
            }
            Err(e) => {
                tracing::warn!(engine = self.engine.name(), error = %e, "engine failed");
                emitter.progress(ProgressEvent::Failed { message: e.to_string() });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::DownloadError;
    use crate::downloader::models::{EngineCapability, SessionEvent};
    use crate::downloader::planner::DownloadPlanner;
    use crate::downloader::testing::{ScriptedEngine, Step};
    use tokio::sync::mpsc;

    async fn run(engine: ScriptedEngine) -> Vec<SessionEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let emitter = ProgressEmitter::new(tx);
        let request = DownloadRequest::new("https://example.com/v", "/tmp").unwrap();
        let plan = DownloadPlanner::plan(EngineCapability::Full);

        EngineAdapter::new(Arc::new(engine)).start(&request, &plan, &emitter).await;
        drop(emitter);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn progress_only(events: &[SessionEvent]) -> Vec<ProgressEvent> {
        events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Progress(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn downloading_hook_becomes_percent() {
        let events = run(ScriptedEngine::succeeding(vec![Step::Progress(EngineProgress::downloading(50, Some(200)))])).await;

        assert_eq!(events[0], SessionEvent::Progress(ProgressEvent::Downloading { percent: 25 }));
        assert_eq!(events[1], SessionEvent::Status("Downloading: 25%".to_string()));
    }

    #[tokio::test]
    async fn unknown_total_reports_zero() {
        let events = run(ScriptedEngine::succeeding(vec![Step::Progress(EngineProgress::downloading(999, None))])).await;
        assert_eq!(events[0], SessionEvent::Progress(ProgressEvent::Downloading { percent: 0 }));
    }

    #[tokio::test]
    async fn finished_hook_merges_before_finish() {
        let events = run(ScriptedEngine::succeeding(vec![Step::Progress(EngineProgress::finished())])).await;

        assert_eq!(
            progress_only(&events),
            vec![
                ProgressEvent::Merging,
                ProgressEvent::Downloading { percent: 100 },
                ProgressEvent::Finished,
            ]
        );
        assert!(events.contains(&SessionEvent::Log(STATUS_MERGING.to_string())));
        assert!(events.contains(&SessionEvent::Log(LOG_SUCCESS.to_string())));
    }

    #[tokio::test]
    async fn logger_severities_are_prefixed_in_order() {
        let events = run(ScriptedEngine::succeeding(vec![
            Step::Debug("[info] fetching"),
            Step::Warning("slow"),
            Step::Progress(EngineProgress::downloading(1, Some(2))),
            Step::Error("fragment lost"),
        ]))
        .await;

        assert_eq!(events[0], SessionEvent::Log("[info] fetching".to_string()));
        assert_eq!(events[1], SessionEvent::Log("WARNING: slow".to_string()));
        assert_eq!(events[2], SessionEvent::Progress(ProgressEvent::Downloading { percent: 50 }));
        assert_eq!(events[4], SessionEvent::Log("ERROR: fragment lost".to_string()));
    }

    #[tokio::test]
    async fn engine_error_becomes_single_failure() {
        let engine = ScriptedEngine::failing(vec![], DownloadError::Engine("Network unreachable".to_string()));
        let events = run(engine).await;

        assert_eq!(
            progress_only(&events),
            vec![ProgressEvent::Failed { message: "Network unreachable".to_string() }]
        );
    }
}
