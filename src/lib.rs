pub mod downloader;
pub mod logging;

use std::sync::Arc;

pub use downloader::{
    DownloadError, DownloadSession, EngineConfig, EventSink, MuxerProbe, SessionState, ToolManager, YtDlpEngine,
};

/// Session wired to the yt-dlp engine and the ffmpeg probe described by `config`
pub fn default_session(config: &EngineConfig) -> DownloadSession {
    let engine = YtDlpEngine::new(config);
    let probe = MuxerProbe::new(ToolManager::from_config(config));
    DownloadSession::new(Arc::new(engine), Arc::new(probe))
}
