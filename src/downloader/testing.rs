// Test doubles for the engine, probe and presentation seams

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::errors::DownloadError;
use super::models::{DownloadPlan, DownloadRequest, EngineCapability, EngineProgress};
use super::traits::{CapabilityProbe, DownloadEngine, EngineHooks, EventSink};

#[derive(Debug, Clone)]
pub enum Step {
    Progress(EngineProgress),
    Debug(&'static str),
    Warning(&'static str),
    Error(&'static str),
}

/// Replays a fixed sequence of hook calls, then returns a fixed outcome
pub struct ScriptedEngine {
    steps: Vec<Step>,
    outcome: Result<(), DownloadError>,
    pub seen_plans: Arc<Mutex<Vec<DownloadPlan>>>,
}

impl ScriptedEngine {
    pub fn succeeding(steps: Vec<Step>) -> Self {
        Self {
            steps,
            outcome: Ok(()),
            seen_plans: Arc::default(),
        }
    }

    pub fn failing(steps: Vec<Step>, error: DownloadError) -> Self {
        Self {
            steps,
            outcome: Err(error),
            seen_plans: Arc::default(),
        }
    }
}

#[async_trait]
impl DownloadEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn download(
        &self,
        _request: &DownloadRequest,
        plan: &DownloadPlan,
        hooks: &mut (dyn EngineHooks + Send),
    ) -> Result<(), DownloadError> {
        self.seen_plans.lock().unwrap().push(plan.clone());
        for step in &self.steps {
            match step {
                Step::Progress(p) => hooks.progress(p),
                Step::Debug(m) => hooks.debug(m),
                Step::Warning(m) => hooks.warning(m),
                Step::Error(m) => hooks.error(m),
            }
            tokio::task::yield_now().await;
        }
        self.outcome.clone()
    }
}

/// Engine whose worker dies mid-run
pub struct PanickingEngine;

#[async_trait]
impl DownloadEngine for PanickingEngine {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn download(
        &self,
        _request: &DownloadRequest,
        _plan: &DownloadPlan,
        _hooks: &mut (dyn EngineHooks + Send),
    ) -> Result<(), DownloadError> {
        panic!("engine blew up");
    }
}

pub struct FixedProbe(pub EngineCapability);

impl CapabilityProbe for FixedProbe {
    fn probe(&self) -> EngineCapability {
        self.0
    }
}

/// Records every sink call as a readable string
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<String>,
}

impl EventSink for RecordingSink {
    fn on_progress(&mut self, percent: u8) {
        self.calls.push(format!("progress {}", percent));
    }

    fn on_status(&mut self, message: &str) {
        self.calls.push(format!("status {}", message));
    }

    fn on_log(&mut self, line: &str) {
        self.calls.push(format!("log {}", line));
    }

    fn on_finished(&mut self) {
        self.calls.push("finished".to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.calls.push(format!("error {}", message));
    }

    fn on_ready_to_open(&mut self, path: &Path) {
        self.calls.push(format!("open {}", path.display()));
    }
}
