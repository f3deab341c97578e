// DownloadPlanner - picks the download strategy for the detected capability
//
// Full:     best video + best audio (merged), falling back to best single stream;
//           output converted to mp4 with subtitles and metadata embedded.
// Degraded: best stream that is already an mp4, no post-processing.

use super::models::{DownloadPlan, EngineCapability, PostProcessorSpec, TranscodeArgs};

/// Best combined video+audio, falling back to best single stream
pub const FULL_FORMAT: &str = "bestvideo+bestaudio/best";

/// Best stream already in an mp4 container
pub const COMPAT_FORMAT: &str = "best[ext=mp4]";

pub const OUTPUT_CONTAINER: &str = "mp4";

pub struct DownloadPlanner;

impl DownloadPlanner {
    pub fn plan(capability: EngineCapability) -> DownloadPlan {
        match capability {
            EngineCapability::Full => DownloadPlan {
                capability,
                format_selector: FULL_FORMAT.to_string(),
                container_format: Some(OUTPUT_CONTAINER.to_string()),
                post_processors: vec![
                    PostProcessorSpec::ConvertVideo {
                        format: OUTPUT_CONTAINER.to_string(),
                    },
                    PostProcessorSpec::EmbedSubtitles,
                    PostProcessorSpec::EmbedMetadata,
                ],
                transcode: TranscodeArgs::default(),
            },
            EngineCapability::Degraded => DownloadPlan {
                capability,
                format_selector: COMPAT_FORMAT.to_string(),
                container_format: None,
                post_processors: Vec::new(),
                transcode: TranscodeArgs::default(),
            },
        }
    }
}
