// Common data models for the download session

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::DownloadError;

const MISSING_INPUT: &str = "Please enter a video URL and choose a destination folder";

/// One validated download: what to fetch and where to put it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    destination: PathBuf,
}

impl DownloadRequest {
    /// Trim both inputs and reject empty ones.
    pub fn new(url: &str, destination_folder: &str) -> Result<Self, DownloadError> {
        let url = url.trim();
        let folder = destination_folder.trim();

        if url.is_empty() || folder.is_empty() {
            return Err(DownloadError::Validation(MISSING_INPUT.to_string()));
        }

        Ok(Self {
            url: url.to_string(),
            destination: PathBuf::from(folder),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Whether a muxing tool (ffmpeg) is available to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineCapability {
    /// Muxer present: separate streams, merge, convert, embed
    Full,
    /// Muxer absent: single pre-combined mp4 stream, no post-processing
    Degraded,
}

impl EngineCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Degraded => "degraded",
        }
    }
}

/// Post-processing step applied after the raw streams are downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostProcessorSpec {
    ConvertVideo { format: String },
    EmbedSubtitles,
    EmbedMetadata,
}

/// Encoder settings for the post-merge transcode step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeArgs {
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for TranscodeArgs {
    fn default() -> Self {
        Self {
            video_codec: "copy".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

impl TranscodeArgs {
    /// Render as ffmpeg arguments: `-c:v copy -c:a aac -b:a 192k`
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}

/// Engine configuration derived from the capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPlan {
    pub capability: EngineCapability,
    pub format_selector: String,
    pub container_format: Option<String>,
    pub post_processors: Vec<PostProcessorSpec>,
    pub transcode: TranscodeArgs,
}

/// Normalized progress emitted by the engine adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEvent {
    Downloading { percent: u8 },
    Merging,
    Finished,
    Failed { message: String },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed { .. })
    }
}

/// Everything the background worker hands to the foreground, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Progress(ProgressEvent),
    Status(String),
    Log(String),
}

/// Status reported by the engine's progress hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Downloading,
    Finished,
    Error,
    #[serde(other)]
    Other,
}

/// Raw progress-hook payload, as yt-dlp prints it with `%(progress)j`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineProgress {
    pub status: EngineStatus,
    #[serde(default)]
    pub downloaded_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
}

impl EngineProgress {
    pub fn downloading(downloaded: u64, total: Option<u64>) -> Self {
        Self {
            status: EngineStatus::Downloading,
            downloaded_bytes: Some(downloaded as f64),
            total_bytes: total.map(|t| t as f64),
            total_bytes_estimate: None,
        }
    }

    pub fn finished() -> Self {
        Self {
            status: EngineStatus::Finished,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
        }
    }

    /// Exact total if known, else the estimate; zero counts as unknown
    pub fn known_total(&self) -> Option<f64> {
        self.total_bytes
            .filter(|t| *t > 0.0)
            .or(self.total_bytes_estimate.filter(|t| *t > 0.0))
    }

    /// `floor(downloaded * 100 / total)`, clamped to 0..=100; 0 when total is unknown
    pub fn percent(&self) -> u8 {
        let Some(total) = self.known_total() else {
            return 0;
        };
        let downloaded = self.downloaded_bytes.unwrap_or(0.0).max(0.0);
        let percent = (downloaded * 100.0 / total).floor();
        percent.clamp(0.0, 100.0) as u8
    }
}
