use std::path::{Path, PathBuf};

use crate::config::{MediaConfig, TimingConfig};
use crate::error::{DubError, TimingError};
use crate::media::ffmpeg::{VideoEncoding, VideoOutput};
use crate::media::{AudioFilter, FfmpegJob, MediaProber, MediaTranscoder};
use crate::timing::tempo::TempoChain;
use crate::timing::{clamp_ratio, ClampedRatio, RatioKind, TimingWarning};

/// How the synthesized audio will be stretched in stretch-audio mode.
#[derive(Debug, Clone, PartialEq)]
pub struct StretchPlan {
    /// `original / generated`, before and after clamping.
    pub stretch: ClampedRatio,
    /// The `atempo` ratio, i.e. `1 / stretch.applied`.
    pub tempo: f64,
    pub chain: TempoChain,
}

pub fn plan_stretch(
    original_secs: f64,
    generated_secs: f64,
    config: &TimingConfig,
) -> Result<StretchPlan, TimingError> {
    let requested = original_secs / generated_secs;
    if !requested.is_finite() || requested <= 0.0 {
        return Err(TimingError::InvalidRatio(requested));
    }
    let stretch = clamp_ratio(requested, config.min_stretch, config.max_stretch);
    let tempo = 1.0 / stretch.applied;
    let chain = TempoChain::plan(tempo)?;
    Ok(StretchPlan {
        stretch,
        tempo,
        chain,
    })
}

/// How the video will be rescaled in scale-video mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalePlan {
    /// `video / audio`, before and after clamping.
    pub speed: ClampedRatio,
    /// `-itsscale` factor for the video input, `1 / speed.applied`.
    pub time_scale: f64,
    pub scaled_video_secs: f64,
    /// Pad or trim applied to the audio so it fits the scaled video.
    pub audio_fit: Option<AudioFilter>,
}

pub fn plan_scale(video_secs: f64, audio_secs: f64, config: &TimingConfig) -> ScalePlan {
    let speed = clamp_ratio(
        video_secs / audio_secs,
        config.min_speed_ratio,
        config.max_speed_ratio,
    );
    let scaled_video_secs = video_secs / speed.applied;
    ScalePlan {
        speed,
        time_scale: 1.0 / speed.applied,
        scaled_video_secs,
        audio_fit: fit_audio(audio_secs, scaled_video_secs, config.drift_tolerance_secs),
    }
}

/// Pad audio shorter than `target - tolerance`, trim audio longer than
/// `target + tolerance`, otherwise leave it alone.
pub fn fit_audio(audio_secs: f64, target_secs: f64, tolerance_secs: f64) -> Option<AudioFilter> {
    if audio_secs < target_secs - tolerance_secs {
        Some(AudioFilter::PadTo(target_secs))
    } else if audio_secs > target_secs + tolerance_secs {
        Some(AudioFilter::TrimTo(target_secs))
    } else {
        None
    }
}

/// What the final mux does to reconcile the two streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MuxFit {
    /// Pad or trim the audio to the video's length.
    Filter(AudioFilter),
    /// Stop at the end of the shorter stream.
    Shortest,
}

/// Decide the final mux at original video speed. Audio is always the side
/// that gets adjusted. Unknown durations fall back to shortest-stream.
pub fn plan_final_mux(video_secs: Option<f64>, audio_secs: Option<f64>, tolerance_secs: f64) -> MuxFit {
    match (video_secs, audio_secs) {
        (Some(video), Some(audio)) => match fit_audio(audio, video, tolerance_secs) {
            Some(filter) => MuxFit::Filter(filter),
            None => MuxFit::Shortest,
        },
        _ => MuxFit::Shortest,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StretchOutcome {
    /// The audio to mux: the stretched file, or the input when no stretch ran.
    pub audio: PathBuf,
    pub generated_secs: Option<f64>,
    pub plan: Option<StretchPlan>,
    pub stretched_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MuxOutcome {
    pub video_secs: Option<f64>,
    pub audio_secs: Option<f64>,
    /// Present when the video was rescaled.
    pub scale: Option<ScalePlan>,
    /// Present when the video kept its original speed.
    pub fit: Option<MuxFit>,
    pub output_secs: Option<f64>,
}

impl MuxOutcome {
    pub fn video_scaled(&self) -> bool {
        self.scale.is_some()
    }
}

/// Applies timing plans through injected media collaborators and collects
/// the warnings raised along the way.
pub struct Reconciler<'a> {
    prober: &'a dyn MediaProber,
    transcoder: &'a dyn MediaTranscoder,
    timing: &'a TimingConfig,
    media: &'a MediaConfig,
    warnings: Vec<TimingWarning>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        prober: &'a dyn MediaProber,
        transcoder: &'a dyn MediaTranscoder,
        timing: &'a TimingConfig,
        media: &'a MediaConfig,
    ) -> Self {
        Self {
            prober,
            transcoder,
            timing,
            media,
            warnings: Vec::new(),
        }
    }

    pub fn warnings(&self) -> &[TimingWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<TimingWarning> {
        self.warnings
    }

    fn warn(&mut self, warning: TimingWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Probe a duration, treating zero-length results as unknown.
    fn probe(&self, path: &Path) -> Option<f64> {
        self.prober.duration(path).filter(|secs| *secs > 0.0)
    }

    fn check_drift(&mut self, subject: &str, expected_secs: f64, actual_secs: Option<f64>) {
        if let Some(actual_secs) = actual_secs {
            if (actual_secs - expected_secs).abs() > self.timing.drift_tolerance_secs {
                self.warn(TimingWarning::ResidualDrift {
                    subject: subject.to_string(),
                    expected_secs,
                    actual_secs,
                });
            } else {
                tracing::info!(
                    "{} duration {:.2}s matches target {:.2}s",
                    subject,
                    actual_secs,
                    expected_secs
                );
            }
        }
    }

    fn reencode_video(&self) -> VideoOutput {
        VideoOutput::Encode(VideoEncoding {
            codec: self.media.video_codec.clone(),
            profile: self.media.video_profile.clone(),
            pixel_format: self.media.pixel_format.clone(),
        })
    }

    /// Stretch `audio` so it lasts `original_secs`, writing into `work_dir`.
    pub fn stretch_audio(
        &mut self,
        audio: &Path,
        original_secs: f64,
        work_dir: &Path,
    ) -> Result<StretchOutcome, DubError> {
        let generated_secs = self.probe(audio);
        let unchanged = |generated_secs| StretchOutcome {
            audio: audio.to_path_buf(),
            generated_secs,
            plan: None,
            stretched_secs: generated_secs,
        };

        let Some(generated) = generated_secs else {
            self.warn(TimingWarning::DurationUnknown {
                subject: "synthesized audio".to_string(),
                fallback: "skipping the time-stretch".to_string(),
            });
            return Ok(unchanged(None));
        };
        if original_secs <= 0.0 {
            self.warn(TimingWarning::DurationUnknown {
                subject: "original speech".to_string(),
                fallback: "skipping the time-stretch".to_string(),
            });
            return Ok(unchanged(Some(generated)));
        }

        tracing::info!(
            "Original speech: {:.2}s, synthesized audio: {:.2}s",
            original_secs,
            generated
        );

        let plan = plan_stretch(original_secs, generated, self.timing)?;
        if plan.stretch.was_clamped() {
            self.warn(TimingWarning::clamped(RatioKind::AudioStretch, plan.stretch));
        }

        if plan.chain.is_noop() {
            tracing::info!("Synthesized audio already matches, no stretch needed");
            return Ok(StretchOutcome {
                plan: Some(plan),
                ..unchanged(Some(generated))
            });
        }

        let stretched = work_dir.join("ai_voice_stretched.wav");
        let job = FfmpegJob::new(&stretched)
            .input(audio)
            .audio_filters(plan.chain.filters());
        tracing::info!(
            "Stretching audio by {:.3}x (tempo {:.3}, {} step(s))",
            plan.stretch.applied,
            plan.tempo,
            plan.chain.steps().len()
        );
        self.transcoder.run(&job).map_err(DubError::Stretch)?;

        let stretched_secs = self.probe(&stretched);
        self.check_drift("stretched audio", original_secs, stretched_secs);

        Ok(StretchOutcome {
            audio: stretched,
            generated_secs: Some(generated),
            plan: Some(plan),
            stretched_secs,
        })
    }

    /// Replace the audio of `video` with `audio`, keeping the video's speed.
    pub fn mux_at_video_speed(
        &mut self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<MuxOutcome, DubError> {
        let video_secs = self.probe(video);
        let audio_secs = self.probe(audio);
        if video_secs.is_none() || audio_secs.is_none() {
            self.warn(TimingWarning::DurationUnknown {
                subject: if video_secs.is_none() { "video" } else { "audio" }.to_string(),
                fallback: "muxing to the shorter stream".to_string(),
            });
        }

        let fit = plan_final_mux(video_secs, audio_secs, self.timing.mux_tolerance_secs);
        let mut job = FfmpegJob::new(output)
            .input(video)
            .input(audio)
            .video(VideoOutput::Copy)
            .audio_codec(&self.media.audio_codec)
            .map("0:v:0")
            .map("1:a:0");
        match fit {
            MuxFit::Filter(filter) => {
                tracing::info!("Adjusting audio to video length: {}", filter);
                job = job.audio_filters([filter]);
            }
            MuxFit::Shortest => {
                job = job.shortest();
            }
        }

        self.transcoder.run(&job).map_err(DubError::Mux)?;

        let output_secs = self.probe(output);
        if let Some(video_secs) = video_secs {
            self.check_drift("output video", video_secs, output_secs);
        }

        Ok(MuxOutcome {
            video_secs,
            audio_secs,
            scale: None,
            fit: Some(fit),
            output_secs,
        })
    }

    /// Rescale `video` to the length of `audio` and mux the two. Falls back
    /// to [`Self::mux_at_video_speed`] when either duration is unknown.
    pub fn scale_video(
        &mut self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<MuxOutcome, DubError> {
        let (Some(video_secs), Some(audio_secs)) = (self.probe(video), self.probe(audio)) else {
            self.warn(TimingWarning::DurationUnknown {
                subject: "video or synthesized audio".to_string(),
                fallback: "keeping the original video speed".to_string(),
            });
            return self.mux_at_video_speed(video, audio, output);
        };

        if let Some(info) = self.prober.video_info(video) {
            tracing::info!(
                "Video: {:.2}fps, {} codec",
                info.fps,
                info.codec.as_deref().unwrap_or("unknown")
            );
        }
        tracing::info!(
            "Original video: {:.2}s, synthesized audio: {:.2}s",
            video_secs,
            audio_secs
        );

        let plan = plan_scale(video_secs, audio_secs, self.timing);
        if plan.speed.was_clamped() {
            self.warn(TimingWarning::clamped(RatioKind::VideoSpeed, plan.speed));
        }
        tracing::info!(
            "Applying video speed {:.2}x (itsscale {:.3})",
            plan.speed.applied,
            plan.time_scale
        );

        let mut job = FfmpegJob::new(output)
            .scaled_input(video, plan.time_scale)
            .input(audio)
            .video(self.reencode_video())
            .audio_codec(&self.media.audio_codec)
            .map("0:v:0")
            .map("1:a:0")
            .faststart()
            .format("mp4");
        if let Some(filter) = plan.audio_fit {
            tracing::info!("Adjusting audio to scaled video length: {}", filter);
            job = job.audio_filters([filter]);
        }

        self.transcoder.run(&job).map_err(DubError::Mux)?;

        let output_secs = self.probe(output);
        self.check_drift("output video", audio_secs, output_secs);

        Ok(MuxOutcome {
            video_secs: Some(video_secs),
            audio_secs: Some(audio_secs),
            scale: Some(plan),
            fit: None,
            output_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeProber {
        durations: HashMap<PathBuf, f64>,
    }

    impl FakeProber {
        fn with(mut self, path: &str, secs: f64) -> Self {
            self.durations.insert(PathBuf::from(path), secs);
            self
        }
    }

    impl MediaProber for FakeProber {
        fn duration(&self, path: &Path) -> Option<f64> {
            self.durations.get(path).copied()
        }
    }

    #[derive(Default)]
    struct RecordingTranscoder {
        jobs: RefCell<Vec<FfmpegJob>>,
        fail: bool,
    }

    impl MediaTranscoder for RecordingTranscoder {
        fn run(&self, job: &FfmpegJob) -> Result<(), MediaError> {
            self.jobs.borrow_mut().push(job.clone());
            if self.fail {
                Err(MediaError::Failed {
                    tool: "ffmpeg".to_string(),
                    code: Some(1),
                    stderr: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn timing() -> TimingConfig {
        TimingConfig::default()
    }

    #[test]
    fn test_plan_stretch_exact_bound_not_clamped() {
        // 1.2s of speech, 2.4s synthesized: stretch 0.5, tempo 2.0.
        let plan = plan_stretch(1.2, 2.4, &timing()).unwrap();
        assert_eq!(plan.stretch.applied, 0.5);
        assert!(!plan.stretch.was_clamped());
        assert_eq!(plan.tempo, 2.0);
        assert_eq!(plan.chain.steps(), &[2.0]);
    }

    #[test]
    fn test_plan_stretch_clamps_high() {
        let plan = plan_stretch(9.0, 3.0, &timing()).unwrap();
        assert_eq!(plan.stretch.requested, 3.0);
        assert_eq!(plan.stretch.applied, 2.0);
        assert!(plan.stretch.was_clamped());
        assert_eq!(plan.tempo, 0.5);
    }

    #[test]
    fn test_plan_stretch_clamps_low() {
        let plan = plan_stretch(3.0, 10.0, &timing()).unwrap();
        assert!((plan.stretch.requested - 0.3).abs() < 1e-12);
        assert_eq!(plan.stretch.applied, 0.5);
        assert_eq!(plan.tempo, 2.0);
    }

    #[test]
    fn test_plan_stretch_identical_durations_is_noop() {
        let plan = plan_stretch(4.0, 4.0, &timing()).unwrap();
        assert!(plan.chain.is_noop());
    }

    #[test]
    fn test_plan_stretch_rejects_zero_generated() {
        assert!(plan_stretch(4.0, 0.0, &timing()).is_err());
    }

    #[test]
    fn test_plan_scale_clamps_to_max_speed() {
        let plan = plan_scale(40.0, 10.0, &timing());
        assert_eq!(plan.speed.requested, 4.0);
        assert_eq!(plan.speed.applied, 2.5);
        assert_eq!(plan.time_scale, 0.4);
        assert_eq!(plan.scaled_video_secs, 16.0);
        // Audio (10s) is far shorter than the scaled video (16s).
        assert_eq!(plan.audio_fit, Some(AudioFilter::PadTo(16.0)));
    }

    #[test]
    fn test_plan_scale_clamps_to_min_speed() {
        let plan = plan_scale(4.0, 20.0, &timing());
        assert_eq!(plan.speed.applied, 0.5);
        assert_eq!(plan.scaled_video_secs, 8.0);
        assert_eq!(plan.audio_fit, Some(AudioFilter::TrimTo(8.0)));
    }

    #[test]
    fn test_plan_scale_in_range_needs_no_fit() {
        let plan = plan_scale(12.0, 8.0, &timing());
        assert!(!plan.speed.was_clamped());
        assert_eq!(plan.speed.applied, 1.5);
        assert!((plan.scaled_video_secs - 8.0).abs() < 1e-9);
        assert_eq!(plan.audio_fit, None);
    }

    #[test]
    fn test_fit_audio_tolerance_band() {
        assert_eq!(fit_audio(9.6, 10.0, 0.5), None);
        assert_eq!(fit_audio(10.4, 10.0, 0.5), None);
        assert_eq!(fit_audio(9.4, 10.0, 0.5), Some(AudioFilter::PadTo(10.0)));
        assert_eq!(fit_audio(10.6, 10.0, 0.5), Some(AudioFilter::TrimTo(10.0)));
    }

    #[test]
    fn test_final_mux_small_difference_uses_shortest() {
        assert_eq!(plan_final_mux(Some(10.0), Some(10.9), 1.0), MuxFit::Shortest);
    }

    #[test]
    fn test_final_mux_large_difference_trims() {
        assert_eq!(
            plan_final_mux(Some(10.0), Some(11.2), 1.0),
            MuxFit::Filter(AudioFilter::TrimTo(10.0))
        );
        assert_eq!(
            plan_final_mux(Some(10.0), Some(7.0), 1.0),
            MuxFit::Filter(AudioFilter::PadTo(10.0))
        );
    }

    #[test]
    fn test_final_mux_unknown_durations_use_shortest() {
        assert_eq!(plan_final_mux(None, None, 1.0), MuxFit::Shortest);
        assert_eq!(plan_final_mux(Some(10.0), None, 1.0), MuxFit::Shortest);
        assert_eq!(plan_final_mux(None, Some(3.0), 1.0), MuxFit::Shortest);
    }

    #[test]
    fn test_stretch_audio_runs_tempo_chain() {
        let prober = FakeProber::default()
            .with("/work/ai_voice.mp3", 2.4)
            .with("/work/ai_voice_stretched.wav", 1.2);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let outcome = reconciler
            .stretch_audio(Path::new("/work/ai_voice.mp3"), 1.2, Path::new("/work"))
            .unwrap();

        assert_eq!(outcome.audio, PathBuf::from("/work/ai_voice_stretched.wav"));
        assert_eq!(outcome.stretched_secs, Some(1.2));
        assert!(reconciler.warnings().is_empty());

        let jobs = transcoder.jobs.borrow();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].audio_filters, vec![AudioFilter::Tempo(2.0)]);
    }

    #[test]
    fn test_stretch_audio_clamp_warns() {
        let prober = FakeProber::default()
            .with("/work/ai_voice.mp3", 2.0)
            .with("/work/ai_voice_stretched.wav", 4.0);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        reconciler
            .stretch_audio(Path::new("/work/ai_voice.mp3"), 6.0, Path::new("/work"))
            .unwrap();

        let warnings = reconciler.into_warnings();
        assert_eq!(
            warnings[0],
            TimingWarning::RatioClamped {
                ratio: RatioKind::AudioStretch,
                requested: 3.0,
                applied: 2.0,
            }
        );
        // Result is 4s but the speech was 6s long.
        assert!(matches!(warnings[1], TimingWarning::ResidualDrift { .. }));
    }

    #[test]
    fn test_stretch_audio_skips_when_duration_unknown() {
        let prober = FakeProber::default();
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let outcome = reconciler
            .stretch_audio(Path::new("/work/ai_voice.mp3"), 3.0, Path::new("/work"))
            .unwrap();

        assert_eq!(outcome.audio, PathBuf::from("/work/ai_voice.mp3"));
        assert!(outcome.plan.is_none());
        assert!(transcoder.jobs.borrow().is_empty());
        assert!(matches!(
            reconciler.warnings()[0],
            TimingWarning::DurationUnknown { .. }
        ));
    }

    #[test]
    fn test_stretch_audio_skips_without_original_speech() {
        let prober = FakeProber::default().with("/work/ai_voice.mp3", 2.4);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());

        for original_secs in [0.0, -1.0] {
            let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);
            let outcome = reconciler
                .stretch_audio(Path::new("/work/ai_voice.mp3"), original_secs, Path::new("/work"))
                .unwrap();

            assert_eq!(outcome.audio, PathBuf::from("/work/ai_voice.mp3"));
            assert_eq!(outcome.generated_secs, Some(2.4));
            assert_eq!(outcome.stretched_secs, Some(2.4));
            assert!(outcome.plan.is_none());
            match &reconciler.warnings()[..] {
                [TimingWarning::DurationUnknown { subject, .. }] => {
                    assert_eq!(subject, "original speech")
                }
                other => panic!("unexpected warnings: {:?}", other),
            }
        }
        assert!(transcoder.jobs.borrow().is_empty());
    }

    #[test]
    fn test_stretch_audio_noop_skips_ffmpeg() {
        let prober = FakeProber::default().with("/work/ai_voice.mp3", 3.0);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let outcome = reconciler
            .stretch_audio(Path::new("/work/ai_voice.mp3"), 3.0, Path::new("/work"))
            .unwrap();

        assert_eq!(outcome.audio, PathBuf::from("/work/ai_voice.mp3"));
        assert!(outcome.plan.unwrap().chain.is_noop());
        assert!(transcoder.jobs.borrow().is_empty());
    }

    #[test]
    fn test_scale_video_builds_itsscale_job() {
        let prober = FakeProber::default()
            .with("in.mp4", 20.0)
            .with("voice.mp3", 10.0)
            .with("out.mp4", 10.0);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let outcome = reconciler
            .scale_video(Path::new("in.mp4"), Path::new("voice.mp3"), Path::new("out.mp4"))
            .unwrap();

        assert!(outcome.video_scaled());
        let plan = outcome.scale.unwrap();
        assert_eq!(plan.speed.applied, 2.0);
        assert_eq!(plan.time_scale, 0.5);

        let jobs = transcoder.jobs.borrow();
        let job = &jobs[0];
        assert_eq!(job.inputs[0].time_scale, Some(0.5));
        assert!(matches!(job.video, VideoOutput::Encode(_)));
        assert!(job.audio_filters.is_empty());
        assert_eq!(job.format.as_deref(), Some("mp4"));
        assert!(reconciler.warnings().is_empty());
    }

    #[test]
    fn test_scale_video_clamp_warns_and_pads() {
        let prober = FakeProber::default()
            .with("in.mp4", 40.0)
            .with("voice.mp3", 10.0)
            .with("out.mp4", 16.0);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        reconciler
            .scale_video(Path::new("in.mp4"), Path::new("voice.mp3"), Path::new("out.mp4"))
            .unwrap();

        let jobs = transcoder.jobs.borrow();
        assert_eq!(jobs[0].audio_filters, vec![AudioFilter::PadTo(16.0)]);
        let warnings = reconciler.warnings();
        assert!(warnings.contains(&TimingWarning::RatioClamped {
            ratio: RatioKind::VideoSpeed,
            requested: 4.0,
            applied: 2.5,
        }));
        // The output (16s) diverges from the synthesized audio (10s).
        assert!(warnings
            .iter()
            .any(|w| matches!(w, TimingWarning::ResidualDrift { .. })));
    }

    #[test]
    fn test_scale_video_unknown_duration_falls_back_to_plain_mux() {
        let prober = FakeProber::default().with("voice.mp3", 10.0);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let outcome = reconciler
            .scale_video(Path::new("in.mp4"), Path::new("voice.mp3"), Path::new("out.mp4"))
            .unwrap();

        assert!(!outcome.video_scaled());
        assert_eq!(outcome.fit, Some(MuxFit::Shortest));
        let jobs = transcoder.jobs.borrow();
        assert!(jobs[0].shortest);
        assert_eq!(jobs[0].video, VideoOutput::Copy);
        assert!(jobs[0].audio_filters.is_empty());
    }

    #[test]
    fn test_mux_at_video_speed_trims_long_audio() {
        let prober = FakeProber::default()
            .with("in.mp4", 10.0)
            .with("voice.wav", 11.2)
            .with("out.mp4", 10.0);
        let transcoder = RecordingTranscoder::default();
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let outcome = reconciler
            .mux_at_video_speed(Path::new("in.mp4"), Path::new("voice.wav"), Path::new("out.mp4"))
            .unwrap();

        assert_eq!(outcome.fit, Some(MuxFit::Filter(AudioFilter::TrimTo(10.0))));
        let jobs = transcoder.jobs.borrow();
        assert!(!jobs[0].shortest);
        assert_eq!(jobs[0].maps, vec!["0:v:0", "1:a:0"]);
        assert!(reconciler.warnings().is_empty());
    }

    #[test]
    fn test_mux_failure_is_fatal() {
        let prober = FakeProber::default();
        let transcoder = RecordingTranscoder {
            fail: true,
            ..Default::default()
        };
        let (timing, media) = (timing(), MediaConfig::default());
        let mut reconciler = Reconciler::new(&prober, &transcoder, &timing, &media);

        let err = reconciler
            .mux_at_video_speed(Path::new("in.mp4"), Path::new("voice.wav"), Path::new("out.mp4"))
            .unwrap_err();
        assert!(matches!(err, DubError::Mux(_)));
    }
}
