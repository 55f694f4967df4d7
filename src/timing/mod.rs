//! Duration matching between the original video and the synthesized voice.
//!
//! Two strategies exist and a run uses exactly one of them:
//!
//! * [`ReconcileMode::StretchAudio`] time-stretches the new voice to the
//!   length of the original speech and keeps the video untouched.
//! * [`ReconcileMode::ScaleVideo`] rescales the video's timestamps so the
//!   picture lasts as long as the new voice.
//!
//! Every ratio is clamped to a configured range. Clamping, residual drift and
//! unknown durations are reported as [`TimingWarning`]s and never fail a run.

pub mod reconcile;
pub mod tempo;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use reconcile::{MuxFit, MuxOutcome, Reconciler, ScalePlan, StretchOutcome, StretchPlan};
pub use tempo::TempoChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileMode {
    /// Stretch the synthesized audio to the transcript's duration.
    StretchAudio,
    /// Rescale the video to the synthesized audio's duration.
    ScaleVideo,
}

impl fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StretchAudio => write!(f, "stretch-audio"),
            Self::ScaleVideo => write!(f, "scale-video"),
        }
    }
}

/// Which ratio a clamp applied to. The two have different bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    AudioStretch,
    VideoSpeed,
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioStretch => write!(f, "audio stretch"),
            Self::VideoSpeed => write!(f, "video speed"),
        }
    }
}

/// A ratio before and after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClampedRatio {
    pub requested: f64,
    pub applied: f64,
}

impl ClampedRatio {
    pub fn was_clamped(&self) -> bool {
        self.requested != self.applied
    }
}

/// Clamp `requested` into `[min, max]`. A value exactly on a bound is not
/// considered clamped.
pub fn clamp_ratio(requested: f64, min: f64, max: f64) -> ClampedRatio {
    let applied = if requested < min {
        min
    } else if requested > max {
        max
    } else {
        requested
    };
    ClampedRatio { requested, applied }
}

/// A non-fatal deviation noticed while reconciling timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimingWarning {
    RatioClamped {
        ratio: RatioKind,
        requested: f64,
        applied: f64,
    },
    ResidualDrift {
        subject: String,
        expected_secs: f64,
        actual_secs: f64,
    },
    DurationUnknown {
        subject: String,
        fallback: String,
    },
}

impl TimingWarning {
    pub(crate) fn clamped(ratio: RatioKind, clamp: ClampedRatio) -> Self {
        Self::RatioClamped {
            ratio,
            requested: clamp.requested,
            applied: clamp.applied,
        }
    }
}

impl fmt::Display for TimingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RatioClamped {
                ratio,
                requested,
                applied,
            } => write!(
                f,
                "{} ratio {:.3}x is out of range, limited to {:.3}x",
                ratio, requested, applied
            ),
            Self::ResidualDrift {
                subject,
                expected_secs,
                actual_secs,
            } => write!(
                f,
                "{} lasts {:.2}s, expected {:.2}s (off by {:.2}s)",
                subject,
                actual_secs,
                expected_secs,
                (actual_secs - expected_secs).abs()
            ),
            Self::DurationUnknown { subject, fallback } => {
                write!(f, "duration of {} is unknown; {}", subject, fallback)
            }
        }
    }
}
