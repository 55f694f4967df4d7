//! One dub run, start to finish.
//!
//! `Idle -> AudioExtracted -> Transcribed -> Synthesized ->
//! {Stretched | VideoScaled} -> Muxed -> Done`, or `Failed` at the first
//! stage that cannot complete. Intermediates live in a temporary directory
//! that is removed when the run ends.

pub mod report;
pub mod stage;

use std::path::{Path, PathBuf};

use crate::config::{Config, MediaConfig};
use crate::error::DubError;
use crate::media::ffmpeg::VideoOutput;
use crate::media::{missing_tools, FfmpegJob, MediaProber, MediaTranscoder};
use crate::script::compose;
use crate::synth::SpeechSynthesizer;
use crate::timing::{ReconcileMode, Reconciler};
use crate::transcribe::Transcriber;

pub use report::RunReport;
pub use stage::RunStage;

const EXTRACTED_AUDIO: &str = "original_audio.wav";
const SYNTHESIZED_AUDIO: &str = "ai_voice.mp3";

#[derive(Debug, Clone, PartialEq)]
pub struct DubRequest {
    pub video: PathBuf,
    pub output: PathBuf,
    pub voice_id: String,
    pub mode: ReconcileMode,
}

/// `<dir>/<stem>_voice_changed.mp4` next to the input video.
pub fn default_output_path(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    video.with_file_name(format!("{}_voice_changed.mp4", stem))
}

/// Fail unless the configured ffmpeg and ffprobe binaries can be found.
pub fn check_dependencies(media: &MediaConfig) -> Result<(), DubError> {
    let missing = missing_tools(&[media.ffmpeg.as_str(), media.ffprobe.as_str()]);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DubError::MissingDependency(missing))
    }
}

pub struct DubPipeline<'a> {
    config: &'a Config,
    prober: &'a dyn MediaProber,
    transcoder: &'a dyn MediaTranscoder,
    transcriber: &'a Transcriber,
    synthesizer: &'a dyn SpeechSynthesizer,
}

impl<'a> DubPipeline<'a> {
    pub fn new(
        config: &'a Config,
        prober: &'a dyn MediaProber,
        transcoder: &'a dyn MediaTranscoder,
        transcriber: &'a Transcriber,
        synthesizer: &'a dyn SpeechSynthesizer,
    ) -> Self {
        Self {
            config,
            prober,
            transcoder,
            transcriber,
            synthesizer,
        }
    }

    /// Run every stage for `request`, recording progress in `report`. The
    /// report ends in `Done` or `Failed` either way.
    pub fn run(&self, request: &DubRequest, report: &mut RunReport) -> Result<(), DubError> {
        match self.execute(request, report) {
            Ok(()) => {
                report.advance(RunStage::Done);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Run failed: {}", e);
                report.fail(&e);
                Err(e)
            }
        }
    }

    fn execute(&self, request: &DubRequest, report: &mut RunReport) -> Result<(), DubError> {
        if !request.video.is_file() {
            return Err(DubError::InputNotFound(request.video.clone()));
        }
        tracing::info!("Processing video: {}", request.video.display());

        let work_dir = tempfile::Builder::new()
            .prefix("redub-")
            .tempdir()
            .map_err(|e| DubError::io(RunStage::Idle, "creating the work directory", e))?;

        let extracted = work_dir.path().join(EXTRACTED_AUDIO);
        self.extract_audio(&request.video, &extracted)?;
        report.advance(RunStage::AudioExtracted);

        let transcript = self.transcriber.transcribe(&extracted)?;
        report.durations.original_speech_secs = Some(transcript.total_duration);
        report.advance(RunStage::Transcribed);

        let script = compose(&transcript, &self.config.pauses);
        tracing::info!("Synthesizing speech with {}", self.synthesizer.name());
        let audio = self
            .synthesizer
            .synthesize(&script, &request.voice_id)
            .map_err(|e| DubError::Synthesis(format!("{:#}", e)))?;
        let voice = work_dir.path().join(SYNTHESIZED_AUDIO);
        std::fs::write(&voice, &audio)
            .map_err(|e| DubError::io(RunStage::Synthesized, "writing synthesized audio", e))?;
        tracing::info!("Synthesized {} bytes of audio", audio.len());
        report.advance(RunStage::Synthesized);

        let mut reconciler = Reconciler::new(
            self.prober,
            self.transcoder,
            &self.config.timing,
            &self.config.media,
        );
        let result = reconcile(
            &mut reconciler,
            request,
            &voice,
            transcript.total_duration,
            work_dir.path(),
            report,
        );
        report.warnings.extend(reconciler.into_warnings());
        result
    }

    fn extract_audio(&self, video: &Path, output: &Path) -> Result<(), DubError> {
        let media = &self.config.media;
        let job = FfmpegJob::new(output)
            .input(video)
            .video(VideoOutput::Disabled)
            .audio_codec("pcm_s16le")
            .sample_rate(media.extract_sample_rate)
            .channels(media.extract_channels);
        tracing::info!("Extracting audio from video");
        self.transcoder.run(&job).map_err(DubError::Extraction)
    }
}

fn reconcile(
    reconciler: &mut Reconciler<'_>,
    request: &DubRequest,
    voice: &Path,
    original_speech_secs: f64,
    work_dir: &Path,
    report: &mut RunReport,
) -> Result<(), DubError> {
    match request.mode {
        ReconcileMode::StretchAudio => {
            let stretched = reconciler.stretch_audio(voice, original_speech_secs, work_dir)?;
            report.record_stretch(&stretched);
            report.advance(RunStage::Stretched);

            let muxed = reconciler.mux_at_video_speed(&request.video, &stretched.audio, &request.output)?;
            report.record_mux(&muxed);
        }
        ReconcileMode::ScaleVideo => {
            let muxed = reconciler.scale_video(&request.video, voice, &request.output)?;
            report.record_mux(&muxed);
            if muxed.video_scaled() {
                report.advance(RunStage::VideoScaled);
            }
        }
    }
    report.advance(RunStage::Muxed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/videos/talk.mov")),
            PathBuf::from("/videos/talk_voice_changed.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("clip.mp4")),
            PathBuf::from("clip_voice_changed.mp4")
        );
    }

    #[test]
    fn test_check_dependencies_names_missing_tools() {
        let media = MediaConfig {
            ffmpeg: "redub-no-such-ffmpeg".to_string(),
            ffprobe: "redub-no-such-ffprobe".to_string(),
            ..MediaConfig::default()
        };
        match check_dependencies(&media) {
            Err(DubError::MissingDependency(tools)) => {
                assert_eq!(tools, vec!["redub-no-such-ffmpeg", "redub-no-such-ffprobe"]);
            }
            other => panic!("expected MissingDependency, got {:?}", other),
        }
    }
}
