use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use redub::config::Config;
use redub::media::ffmpeg::VideoOutput;
use redub::media::{AudioFilter, FfmpegJob, MediaError, MediaProber, MediaTranscoder};
use redub::pipeline::{DubPipeline, DubRequest, RunReport, RunStage};
use redub::script::AnnotatedScript;
use redub::synth::SpeechSynthesizer;
use redub::timing::{RatioKind, ReconcileMode, TimingWarning};
use redub::transcribe::manual::ManualEntry;
use redub::transcribe::{Transcriber, Transcript, TranscriptSegment, TranscriptionBackend};
use redub::DubError;
use tempfile::TempDir;

/// Durations keyed by file name, since intermediates land in a random
/// temporary directory.
#[derive(Default)]
struct FakeProber {
    durations: HashMap<String, f64>,
}

impl FakeProber {
    fn with(mut self, name: &str, secs: f64) -> Self {
        self.durations.insert(name.to_string(), secs);
        self
    }
}

impl MediaProber for FakeProber {
    fn duration(&self, path: &Path) -> Option<f64> {
        let name = path.file_name()?.to_string_lossy().to_string();
        self.durations.get(&name).copied()
    }
}

#[derive(Default)]
struct RecordingTranscoder {
    jobs: RefCell<Vec<FfmpegJob>>,
}

impl MediaTranscoder for RecordingTranscoder {
    fn run(&self, job: &FfmpegJob) -> Result<(), MediaError> {
        self.jobs.borrow_mut().push(job.clone());
        Ok(())
    }
}

struct FakeSynthesizer {
    scripts: RefCell<Vec<String>>,
    fail: bool,
}

impl FakeSynthesizer {
    fn new() -> Self {
        Self {
            scripts: RefCell::new(Vec::new()),
            fail: false,
        }
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn name(&self) -> &str {
        "fake"
    }

    fn synthesize(&self, script: &AnnotatedScript, _voice_id: &str) -> anyhow::Result<Vec<u8>> {
        self.scripts.borrow_mut().push(script.to_string());
        if self.fail {
            anyhow::bail!("quota exceeded");
        }
        Ok(b"ID3 fake mp3".to_vec())
    }
}

struct FixedBackend(Transcript);

impl TranscriptionBackend for FixedBackend {
    fn name(&self) -> &str {
        "fixed"
    }

    fn transcribe(&self, _audio_path: &Path) -> anyhow::Result<Transcript> {
        Ok(self.0.clone())
    }
}

fn hello_world() -> Transcriber {
    let transcript = Transcript::from_segments(vec![TranscriptSegment::new("Hello world.", 0.0, 1.2)]);
    Transcriber::new(Some(Box::new(FixedBackend(transcript))), ManualEntry::Disabled, 150.0)
}

struct Fixture {
    _tmp: TempDir,
    request: DubRequest,
}

fn fixture(mode: ReconcileMode) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let video = tmp.path().join("talk.mp4");
    std::fs::write(&video, b"not really a video").unwrap();
    let request = DubRequest {
        video,
        output: tmp.path().join("talk_voice_changed.mp4"),
        voice_id: "UgBBYS2sOqTuMpoF3BR0".to_string(),
        mode,
    };
    Fixture { _tmp: tmp, request }
}

fn run(
    config: &Config,
    prober: &FakeProber,
    transcoder: &RecordingTranscoder,
    transcriber: &Transcriber,
    synthesizer: &FakeSynthesizer,
    request: &DubRequest,
) -> (Result<(), DubError>, RunReport) {
    let mut report = RunReport::new(&request.video, &request.output, request.mode);
    let result = DubPipeline::new(config, prober, transcoder, transcriber, synthesizer).run(request, &mut report);
    (result, report)
}

fn arg_strings(job: &FfmpegJob) -> Vec<String> {
    job.args()
        .iter()
        .map(|a| a.to_string_lossy().to_string())
        .collect()
}

#[test]
fn test_stretch_audio_hello_world() {
    let fx = fixture(ReconcileMode::StretchAudio);
    let config = Config::default();
    let prober = FakeProber::default()
        .with("talk.mp4", 1.5)
        .with("ai_voice.mp3", 2.4)
        .with("ai_voice_stretched.wav", 1.2)
        .with("talk_voice_changed.mp4", 1.5);
    let transcoder = RecordingTranscoder::default();
    let synthesizer = FakeSynthesizer::new();

    let (result, report) = run(&config, &prober, &transcoder, &hello_world(), &synthesizer, &fx.request);
    result.unwrap();

    assert_eq!(report.stage, RunStage::Done);
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.tempo_steps, vec![2.0]);
    assert_eq!(report.durations.original_speech_secs, Some(1.2));

    let scripts = synthesizer.scripts.borrow();
    assert_eq!(
        scripts[0],
        "<break time=\"0.2s\"/> Hello world. <break time=\"0.3s\"/>"
    );

    let jobs = transcoder.jobs.borrow();
    assert_eq!(jobs.len(), 3, "extract, stretch, mux");

    let extract = arg_strings(&jobs[0]);
    assert!(extract.contains(&"-vn".to_string()));
    assert!(extract.contains(&"pcm_s16le".to_string()));
    assert!(extract.contains(&"44100".to_string()));

    assert_eq!(jobs[1].audio_filters, vec![AudioFilter::Tempo(2.0)]);
    assert!(arg_strings(&jobs[1]).contains(&"atempo=2.0".to_string()));

    // 1.2s of voice against 1.5s of video is within the mux tolerance.
    assert_eq!(jobs[2].video, VideoOutput::Copy);
    assert!(jobs[2].shortest);
    assert_eq!(jobs[2].output, fx.request.output);
}

#[test]
fn test_scale_video_clamps_and_pads() {
    let fx = fixture(ReconcileMode::ScaleVideo);
    let config = Config::default();
    // 30s of video against 10s of voice wants 3x, limited to 2.5x.
    let prober = FakeProber::default()
        .with("talk.mp4", 30.0)
        .with("ai_voice.mp3", 10.0);
    let transcoder = RecordingTranscoder::default();

    let (result, report) = run(
        &config,
        &prober,
        &transcoder,
        &hello_world(),
        &FakeSynthesizer::new(),
        &fx.request,
    );
    result.unwrap();

    assert_eq!(report.stage, RunStage::Done);
    assert_eq!(report.video_time_scale, Some(0.4));
    assert_eq!(
        report.warnings,
        vec![TimingWarning::RatioClamped {
            ratio: RatioKind::VideoSpeed,
            requested: 3.0,
            applied: 2.5,
        }]
    );

    let jobs = transcoder.jobs.borrow();
    assert_eq!(jobs.len(), 2, "extract, scale+mux");
    let args = arg_strings(&jobs[1]);
    assert_eq!(&args[..4], &["-itsscale", "0.4", "-i", fx.request.video.to_str().unwrap()]);
    for expected in ["libx264", "baseline", "yuv420p", "aac", "+faststart", "apad=whole_dur=12.0"] {
        assert!(args.iter().any(|a| a == expected), "missing {} in {:?}", expected, args);
    }
    assert_eq!(args[args.len() - 3..args.len() - 1], ["mp4", "-y"]);
}

#[test]
fn test_unknown_durations_fall_back_to_shortest() {
    let fx = fixture(ReconcileMode::ScaleVideo);
    let transcoder = RecordingTranscoder::default();

    let (result, report) = run(
        &Config::default(),
        &FakeProber::default(),
        &transcoder,
        &hello_world(),
        &FakeSynthesizer::new(),
        &fx.request,
    );
    result.unwrap();

    assert_eq!(report.stage, RunStage::Done);
    assert!(report.ratio.is_none());
    assert!(report
        .warnings
        .iter()
        .all(|w| matches!(w, TimingWarning::DurationUnknown { .. })));
    assert!(!report.warnings.is_empty());

    let jobs = transcoder.jobs.borrow();
    let mux = jobs.last().unwrap();
    assert!(mux.shortest);
    assert_eq!(mux.video, VideoOutput::Copy);
    assert!(mux.inputs.iter().all(|input| input.time_scale.is_none()));
}

#[test]
fn test_synthesis_failure_stops_run() {
    let fx = fixture(ReconcileMode::StretchAudio);
    let transcoder = RecordingTranscoder::default();
    let synthesizer = FakeSynthesizer {
        scripts: RefCell::new(Vec::new()),
        fail: true,
    };

    let (result, report) = run(
        &Config::default(),
        &FakeProber::default(),
        &transcoder,
        &hello_world(),
        &synthesizer,
        &fx.request,
    );

    let err = result.unwrap_err();
    assert!(matches!(err, DubError::Synthesis(_)));
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(report.stage, RunStage::Failed);
    assert_eq!(report.failed_stage, Some(RunStage::Synthesized));
    assert_eq!(transcoder.jobs.borrow().len(), 1, "only extraction ran");
}

#[test]
fn test_manual_fallback_when_no_backend() {
    let fx = fixture(ReconcileMode::StretchAudio);
    let prober = FakeProber::default()
        .with("talk.mp4", 2.0)
        .with("ai_voice.mp3", 1.6)
        .with("ai_voice_stretched.wav", 1.2);
    let transcoder = RecordingTranscoder::default();
    // Three words at 150 wpm is 1.2s of estimated speech.
    let transcriber = Transcriber::new(
        None,
        ManualEntry::Text("Hello, big world".to_string()),
        150.0,
    );
    let synthesizer = FakeSynthesizer::new();

    let (result, report) = run(&Config::default(), &prober, &transcoder, &transcriber, &synthesizer, &fx.request);
    result.unwrap();

    assert!(synthesizer.scripts.borrow()[0].contains("Hello, <break time=\"0.2s\"/> big world"));
    let ratio = report.ratio.unwrap();
    assert_eq!(ratio.kind, RatioKind::AudioStretch);
    assert!((ratio.applied - 0.75).abs() < 1e-9);
}

#[test]
fn test_missing_transcript_fails_at_transcription() {
    let fx = fixture(ReconcileMode::StretchAudio);
    let transcoder = RecordingTranscoder::default();
    let transcriber = Transcriber::new(None, ManualEntry::Disabled, 150.0);

    let (result, report) = run(
        &Config::default(),
        &FakeProber::default(),
        &transcoder,
        &transcriber,
        &FakeSynthesizer::new(),
        &fx.request,
    );

    assert!(matches!(result, Err(DubError::TranscriptMissing(_))));
    assert_eq!(report.failed_stage, Some(RunStage::Transcribed));
}

#[test]
fn test_missing_video_fails_before_any_job() {
    let tmp = TempDir::new().unwrap();
    let request = DubRequest {
        video: tmp.path().join("nope.mp4"),
        output: tmp.path().join("out.mp4"),
        voice_id: "v".to_string(),
        mode: ReconcileMode::ScaleVideo,
    };
    let transcoder = RecordingTranscoder::default();

    let (result, report) = run(
        &Config::default(),
        &FakeProber::default(),
        &transcoder,
        &hello_world(),
        &FakeSynthesizer::new(),
        &request,
    );

    assert!(matches!(result, Err(DubError::InputNotFound(_))));
    assert_eq!(report.failed_stage, Some(RunStage::Idle));
    assert!(transcoder.jobs.borrow().is_empty());
}

#[test]
fn test_work_dir_removed_after_run() {
    let fx = fixture(ReconcileMode::StretchAudio);
    let transcoder = RecordingTranscoder::default();

    let (result, _) = run(
        &Config::default(),
        &FakeProber::default(),
        &transcoder,
        &hello_world(),
        &FakeSynthesizer::new(),
        &fx.request,
    );
    result.unwrap();

    let extracted: PathBuf = transcoder.jobs.borrow()[0].output.clone();
    assert_eq!(extracted.file_name().unwrap(), "original_audio.wav");
    assert!(!extracted.parent().unwrap().exists());
}

#[test]
fn test_report_written_as_json() {
    let fx = fixture(ReconcileMode::StretchAudio);
    let prober = FakeProber::default()
        .with("talk.mp4", 1.5)
        .with("ai_voice.mp3", 2.4)
        .with("ai_voice_stretched.wav", 1.2);
    let (result, report) = run(
        &Config::default(),
        &prober,
        &RecordingTranscoder::default(),
        &hello_world(),
        &FakeSynthesizer::new(),
        &fx.request,
    );
    result.unwrap();

    let path = fx.request.output.with_file_name("report.json");
    report.write(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["stage"], "done");
    assert_eq!(json["mode"], "stretch-audio");
    assert_eq!(json["ratio"]["kind"], "audio_stretch");
    assert_eq!(json["tempo_steps"][0], 2.0);
}
