use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::downloader::config::{EngineConfig, NetworkConfig};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{
    DownloadPlan, DownloadRequest, EngineCapability, EngineProgress, PostProcessorSpec,
};
use crate::downloader::tools::{ToolManager, ToolType};
use crate::downloader::traits::{DownloadEngine, EngineHooks};

/// Prefix of the lines carrying progress-hook JSON on stdout
pub const PROGRESS_MARKER: &str = "[vidfetch]";

/// Output name inside the destination folder; yt-dlp sanitizes the title
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// One line of yt-dlp output, classified
#[derive(Debug, Clone, PartialEq)]
pub enum EngineLine {
    Progress(EngineProgress),
    Debug(String),
    Warning(String),
    Error(String),
}

/// Classify a yt-dlp output line. Returns None for blank lines.
pub fn parse_line(line: &str) -> Option<EngineLine> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(r"^\[vidfetch\]\s*(\{.*\})\s*$").unwrap();
        static ref WARNING_RE: Regex = Regex::new(r"^WARNING:\s?(.*)$").unwrap();
        static ref ERROR_RE: Regex = Regex::new(r"^ERROR:\s?(.*)$").unwrap();
    }

    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let json = caps.get(1).map(|m| m.as_str()).unwrap_or("{}");
        match serde_json::from_str::<EngineProgress>(json) {
            Ok(progress) => return Some(EngineLine::Progress(progress)),
            Err(e) => {
                tracing::debug!(error = %e, "unparseable progress line");
                return Some(EngineLine::Debug(line.to_string()));
            }
        }
    }

    if let Some(caps) = WARNING_RE.captures(line) {
        let message = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return Some(EngineLine::Warning(message.to_string()));
    }

    if let Some(caps) = ERROR_RE.captures(line) {
        let message = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        return Some(EngineLine::Error(message.to_string()));
    }

    Some(EngineLine::Debug(line.to_string()))
}

/// Download engine backed by the yt-dlp executable
pub struct YtDlpEngine {
    binary_path: PathBuf,
    ffmpeg_location: Option<PathBuf>,
    network: NetworkConfig,
}

impl YtDlpEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let manager = ToolManager::from_config(config);
        let binary_path = manager
            .locate(ToolType::YtDlp)
            .unwrap_or_else(|| PathBuf::from(ToolType::YtDlp.as_str()));

        // Only an override that exists; otherwise yt-dlp finds ffmpeg on PATH like the probe does
        let ffmpeg_location = manager.override_path(ToolType::Ffmpeg);

        Self {
            binary_path,
            ffmpeg_location,
            network: config.network.clone(),
        }
    }

    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    /// Full argument list for one download
    pub fn build_args(&self, request: &DownloadRequest, plan: &DownloadPlan) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            plan.format_selector.clone(),
            "--no-playlist".to_string(),
            // one progress report per line, as JSON
            "--newline".to_string(),
            "--progress-template".to_string(),
            format!("download:{} %(progress)j", PROGRESS_MARKER),
            "-P".to_string(),
            request.destination().to_string_lossy().to_string(),
            "-o".to_string(),
            OUTPUT_TEMPLATE.to_string(),
        ];

        if let Some(container) = &plan.container_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        for step in &plan.post_processors {
            match step {
                PostProcessorSpec::ConvertVideo { format } => {
                    args.push("--recode-video".to_string());
                    args.push(format.clone());
                }
                PostProcessorSpec::EmbedSubtitles => args.push("--embed-subs".to_string()),
                PostProcessorSpec::EmbedMetadata => args.push("--embed-metadata".to_string()),
            }
        }

        if !plan.post_processors.is_empty() {
            args.push("--postprocessor-args".to_string());
            args.push(format!("VideoConvertor:{}", plan.transcode.to_ffmpeg_args().join(" ")));
        }

        if plan.capability == EngineCapability::Full {
            if let Some(location) = &self.ffmpeg_location {
                args.push("--ffmpeg-location".to_string());
                args.push(location.to_string_lossy().to_string());
            }
        }

        args.extend(self.network.to_args());

        // URL last, never mistaken for an option
        args.push("--".to_string());
        args.push(request.url().to_string());
        args
    }
}

fn forward(line: &str, hooks: &mut (dyn EngineHooks + Send), last_error: &mut Option<String>) {
    match parse_line(line) {
        Some(EngineLine::Progress(progress)) => hooks.progress(&progress),
        Some(EngineLine::Debug(message)) => hooks.debug(&message),
        Some(EngineLine::Warning(message)) => hooks.warning(&message),
        Some(EngineLine::Error(message)) => {
            hooks.error(&message);
            *last_error = Some(message);
        }
        None => {}
    }
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        plan: &DownloadPlan,
        hooks: &mut (dyn EngineHooks + Send),
    ) -> Result<(), DownloadError> {
        let args = self.build_args(request, plan);
        tracing::info!(binary = %self.binary_path.display(), ?args, "starting yt-dlp");

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::ToolNotFound(format!("{}: {}", self.binary_path.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;

        let mut stdout_reader = BufReader::new(stdout);
        let mut stderr_reader = BufReader::new(stderr);
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut last_error: Option<String> = None;
        let mut read_error: Option<String> = None;

        // Single reader loop: lines are forwarded in the order they arrive.
        // Raw bytes: titles in a non-UTF-8 locale must not stall the pipe.
        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout_reader.read_until(b'\n', &mut stdout_buf), if stdout_open => match read {
                    Ok(0) => stdout_open = false,
                    Ok(_) => {
                        forward(&String::from_utf8_lossy(&stdout_buf), hooks, &mut last_error);
                        stdout_buf.clear();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed reading yt-dlp stdout");
                        read_error = Some(format!("Failed to read yt-dlp output: {}", e));
                        stdout_open = false;
                        // nobody drains the pipe any more; don't leave yt-dlp blocked on it
                        let _ = child.start_kill();
                    }
                },
                read = stderr_reader.read_until(b'\n', &mut stderr_buf), if stderr_open => match read {
                    Ok(0) => stderr_open = false,
                    Ok(_) => {
                        forward(&String::from_utf8_lossy(&stderr_buf), hooks, &mut last_error);
                        stderr_buf.clear();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed reading yt-dlp stderr");
                        read_error = Some(format!("Failed to read yt-dlp output: {}", e));
                        stderr_open = false;
                        let _ = child.start_kill();
                    }
                },
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::ExecutionError(format!("Process error: {}", e)))?;

        if let Some(message) = read_error {
            return Err(DownloadError::ExecutionError(message));
        }

        if status.success() {
            tracing::info!("yt-dlp finished");
            return Ok(());
        }

        tracing::warn!(%status, last_error = ?last_error, "yt-dlp failed");
        Err(last_error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("yt-dlp exited with {}", status))
            .into())
    }
}
