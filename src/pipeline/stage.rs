use serde::{Deserialize, Serialize};

/// Where a dub run is. Advances strictly forward; a run ends in `Done` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Idle,
    AudioExtracted,
    Transcribed,
    Synthesized,
    /// Stretch-audio mode: the voice now matches the original speech length.
    Stretched,
    /// Scale-video mode: the video was rescaled and muxed in one pass.
    VideoScaled,
    Muxed,
    Done,
    Failed,
}

impl RunStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AudioExtracted => write!(f, "Audio extracted"),
            Self::Transcribed => write!(f, "Transcribed"),
            Self::Synthesized => write!(f, "Synthesized"),
            Self::Stretched => write!(f, "Audio stretched"),
            Self::VideoScaled => write!(f, "Video scaled"),
            Self::Muxed => write!(f, "Muxed"),
            Self::Done => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}
