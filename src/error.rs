use std::path::PathBuf;

use thiserror::Error;

use crate::media::MediaError;
use crate::pipeline::stage::RunStage;

/// Raised by the tempo planner when handed a ratio it cannot decompose.
#[derive(Debug, Error, PartialEq)]
pub enum TimingError {
    #[error("speed ratio must be a positive finite number, got {0}")]
    InvalidRatio(f64),
}

/// A run-ending failure. Every variant maps to the stage that was in
/// progress when it happened.
#[derive(Debug, Error)]
pub enum DubError {
    #[error("missing required tools: {}", .0.join(", "))]
    MissingDependency(Vec<String>),

    #[error("video file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("audio extraction failed: {0}")]
    Extraction(#[source] MediaError),

    #[error("no transcript available: {0}")]
    TranscriptMissing(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("audio time-stretch failed: {0}")]
    Stretch(#[source] MediaError),

    #[error("muxing failed: {0}")]
    Mux(#[source] MediaError),

    #[error("timing plan rejected: {0}")]
    Timing(#[from] TimingError),

    #[error("I/O error while {context}: {source}")]
    Io {
        stage: RunStage,
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl DubError {
    pub(crate) fn io(stage: RunStage, context: &'static str, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            context,
            source,
        }
    }

    /// The stage that was being entered when this error occurred.
    pub fn stage(&self) -> RunStage {
        match self {
            Self::MissingDependency(_) | Self::InputNotFound(_) => RunStage::Idle,
            Self::Extraction(_) => RunStage::AudioExtracted,
            Self::TranscriptMissing(_) => RunStage::Transcribed,
            Self::Synthesis(_) => RunStage::Synthesized,
            Self::Stretch(_) | Self::Timing(_) => RunStage::Stretched,
            Self::Mux(_) => RunStage::Muxed,
            Self::Io { stage, .. } => *stage,
        }
    }
}
