// Downloader module - capability probe, planner, engine adapter and session

pub mod adapter;
pub mod backends;
pub mod config;
pub mod errors;
pub mod models;
pub mod planner;
pub mod session;
pub mod tools;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::EngineAdapter;
pub use backends::YtDlpEngine;
pub use config::{default_output_dir, EngineConfig, NetworkConfig};
pub use errors::DownloadError;
pub use models::{
    DownloadPlan, DownloadRequest, EngineCapability, EngineProgress, PostProcessorSpec, ProgressEvent,
    SessionEvent,
};
pub use planner::DownloadPlanner;
pub use session::{DownloadSession, SessionState};
pub use tools::{MuxerProbe, ToolInfo, ToolManager, ToolType};
pub use traits::{CapabilityProbe, DownloadEngine, EngineHooks, EventSink, ProgressEmitter};
