use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::error::DubError;
use crate::pipeline::stage::RunStage;
use crate::timing::{MuxOutcome, RatioKind, ReconcileMode, StretchOutcome, TimingWarning};

/// Durations observed during a run. `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunDurations {
    pub original_speech_secs: Option<f64>,
    pub video_secs: Option<f64>,
    pub synthesized_secs: Option<f64>,
    pub stretched_secs: Option<f64>,
    pub output_secs: Option<f64>,
}

/// The stretch or speed ratio that was applied, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedRatio {
    pub kind: RatioKind,
    pub requested: f64,
    pub applied: f64,
}

/// Record of one dub run, written as JSON when `--report` is given.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub stage: RunStage,
    /// The stage that was being entered when the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<RunStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub mode: ReconcileMode,
    pub video: PathBuf,
    pub output: PathBuf,
    pub durations: RunDurations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<AppliedRatio>,
    /// `atempo` steps applied to the voice, empty when none were needed.
    pub tempo_steps: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_time_scale: Option<f64>,
    pub warnings: Vec<TimingWarning>,
    /// RFC 3339 timestamps.
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl RunReport {
    pub fn new(video: &Path, output: &Path, mode: ReconcileMode) -> Self {
        Self {
            stage: RunStage::Idle,
            failed_stage: None,
            error_message: None,
            mode,
            video: video.to_path_buf(),
            output: output.to_path_buf(),
            durations: RunDurations::default(),
            ratio: None,
            tempo_steps: Vec::new(),
            video_time_scale: None,
            warnings: Vec::new(),
            started_at: chrono::Local::now().to_rfc3339(),
            finished_at: None,
        }
    }

    pub fn advance(&mut self, stage: RunStage) {
        tracing::info!("Stage: {}", stage);
        self.stage = stage;
        if stage.is_terminal() {
            self.finished_at = Some(chrono::Local::now().to_rfc3339());
        }
    }

    pub fn fail(&mut self, error: &DubError) {
        self.failed_stage = Some(error.stage());
        self.error_message = Some(error.to_string());
        self.advance(RunStage::Failed);
    }

    pub fn succeeded(&self) -> bool {
        self.stage == RunStage::Done
    }

    pub fn record_stretch(&mut self, outcome: &StretchOutcome) {
        self.durations.synthesized_secs = outcome.generated_secs;
        self.durations.stretched_secs = outcome.stretched_secs;
        if let Some(plan) = &outcome.plan {
            self.ratio = Some(AppliedRatio {
                kind: RatioKind::AudioStretch,
                requested: plan.stretch.requested,
                applied: plan.stretch.applied,
            });
            self.tempo_steps = plan.chain.steps().to_vec();
        }
    }

    pub fn record_mux(&mut self, outcome: &MuxOutcome) {
        self.durations.video_secs = outcome.video_secs;
        if self.durations.synthesized_secs.is_none() {
            self.durations.synthesized_secs = outcome.audio_secs;
        }
        self.durations.output_secs = outcome.output_secs;
        if let Some(plan) = &outcome.scale {
            self.ratio = Some(AppliedRatio {
                kind: RatioKind::VideoSpeed,
                requested: plan.speed.requested,
                applied: plan.speed.applied,
            });
            self.video_time_scale = Some(plan.time_scale);
        }
    }

    /// Write the report as pretty JSON. Goes through a temp file so a reader
    /// never sees a half-written report.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// One-line summary for the end of a run.
    pub fn summary(&self) -> String {
        match self.stage {
            RunStage::Done => {
                let ratio = self
                    .ratio
                    .map(|r| format!("{} {:.2}x", r.kind, r.applied))
                    .unwrap_or_else(|| "no timing change".to_string());
                format!(
                    "Done: {} ({}, {}, {} warning(s))",
                    self.output.display(),
                    self.mode,
                    ratio,
                    self.warnings.len()
                )
            }
            RunStage::Failed => {
                let stage = self.failed_stage.unwrap_or(RunStage::Idle);
                let msg = self.error_message.as_deref().unwrap_or("unknown error");
                format!("Failed at {}: {}", stage, msg)
            }
            stage => format!("In progress: {}", stage),
        }
    }
}
