use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::config::EngineConfig;
use super::models::EngineCapability;
use super::traits::CapabilityProbe;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<PathBuf>,
    ffmpeg_override: Option<PathBuf>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            ytdlp_override: config.ytdlp_path.clone(),
            ffmpeg_override: config.ffmpeg_path.clone(),
        }
    }

    fn override_for(&self, tool_type: ToolType) -> Option<&Path> {
        match tool_type {
            ToolType::YtDlp => self.ytdlp_override.as_deref(),
            ToolType::Ffmpeg => self.ffmpeg_override.as_deref(),
        }
    }

    /// The configured override, if one was given and it exists
    pub fn override_path(&self, tool_type: ToolType) -> Option<PathBuf> {
        let path = self.override_for(tool_type)?;
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(tool = tool_type.as_str(), path = %path.display(), "configured tool path does not exist");
        None
    }

    /// Path of the tool, if it can be found. Never queries the binary itself.
    pub fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        // 1. Explicit override
        if let Some(path) = self.override_path(tool_type) {
            return Some(path);
        }

        // 2. PATH
        if let Ok(path) = which::which(tool_type.as_str()) {
            return Some(path);
        }

        // 3. Common install locations (GUI launches often get a trimmed PATH)
        let binary_name = tool_type.as_str();
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        common_paths
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type);
        let version = path.as_deref().and_then(|p| self.get_version(p, tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            is_available: path.is_some(),
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp),
            self.get_tool_info(ToolType::Ffmpeg),
        ]
    }

    fn get_version(&self, path: &Path, tool_type: ToolType) -> Option<String> {
        match Command::new(path)
            .arg(tool_type.version_arg())
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) if output.status.success() => {
                // ffmpeg prints a banner; the first line carries the version
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
            }
            _ => None,
        }
    }
}

/// Capability probe backed by a lookup of the muxing tool (ffmpeg)
#[derive(Debug, Clone, Default)]
pub struct MuxerProbe {
    manager: ToolManager,
}

impl MuxerProbe {
    pub fn new(manager: ToolManager) -> Self {
        Self { manager }
    }
}

impl CapabilityProbe for MuxerProbe {
    fn probe(&self) -> EngineCapability {
        match self.manager.locate(ToolType::Ffmpeg) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "muxer found");
                EngineCapability::Full
            }
            None => {
                tracing::debug!("muxer not found");
                EngineCapability::Degraded
            }
        }
    }
}
