// Error types for the download session

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Empty URL or destination folder; rejected before any work starts
    #[error("{0}")]
    Validation(String),

    /// The previous download has not been fully retired yet
    #[error("A download is already running in this session")]
    SessionBusy,

    /// yt-dlp (or another required binary) could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Process plumbing failed (pipes, wait, worker join)
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// The engine reported a failure; the text is shown to the user as-is
    #[error("{0}")]
    Engine(String),
}

impl DownloadError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Engine output is plain text; keep it verbatim
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        Self::Engine(s)
    }
}
