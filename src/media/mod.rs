pub mod ffmpeg;
pub mod filter;
pub mod probe;

use thiserror::Error;

pub use ffmpeg::{FfmpegJob, FfmpegTranscoder, MediaTranscoder};
pub use filter::AudioFilter;
pub use probe::{FfprobeProber, MediaProber, VideoInfo};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {}: {stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Returns the tools from `tools` that cannot be resolved on `PATH`.
pub fn missing_tools(tools: &[&str]) -> Vec<String> {
    tools
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .map(|tool| tool.to_string())
        .collect()
}
