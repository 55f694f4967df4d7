use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::DubArgs;
use crate::config::Config;
use crate::error::DubError;
use crate::media::filter;
use crate::media::{FfmpegTranscoder, FfprobeProber, MediaProber};
use crate::pipeline::{self, DubPipeline, DubRequest, RunReport};
use crate::synth::credentials::resolve_api_key_from_env;
use crate::synth::ElevenLabsClient;
use crate::timing::TempoChain;
use crate::transcribe::manual::ManualEntry;
use crate::transcribe::Transcriber;

/// Apply `dub` flag overrides on top of the loaded config and check the
/// result.
pub fn apply_dub_overrides(config: &mut Config, args: &DubArgs) -> Result<()> {
    if let Some(mode) = args.mode_override() {
        config.timing.mode = mode;
    }
    if let Some(ratio) = args.max_speed_ratio {
        config.timing.max_speed_ratio = ratio;
    }
    if let Some(voice) = &args.voice {
        config.voice.voice_id = voice.clone();
    }
    config.validate().context("Invalid dub options")
}

fn synthesis_client(config: &Config, api_key: Option<&str>) -> Result<ElevenLabsClient, DubError> {
    let key = resolve_api_key_from_env(api_key, &config.voice.api_key).ok_or_else(|| {
        DubError::Synthesis(
            "ElevenLabs API key not provided. Pass --api-key, set [voice] api_key, or export ELEVEN_LABS_KEY"
                .to_string(),
        )
    })?;
    ElevenLabsClient::new(&config.voice, key).map_err(|e| DubError::Synthesis(format!("{:#}", e)))
}

/// Run the `dub` command end to end.
pub fn run_dub(mut config: Config, args: DubArgs) -> Result<()> {
    apply_dub_overrides(&mut config, &args)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| pipeline::default_output_path(&args.video));
    let mut report = RunReport::new(&args.video, &output, config.timing.mode);

    let result = dub_video(&config, &args, &output, &mut report);
    if let Err(e) = &result {
        if !report.stage.is_terminal() {
            report.fail(e);
        }
    }

    if let Some(path) = &args.report {
        report.write(path)?;
        tracing::info!("Run report written to {}", path.display());
    }

    println!("{}", report.summary());
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    result.map_err(anyhow::Error::from)
}

fn dub_video(
    config: &Config,
    args: &DubArgs,
    output: &Path,
    report: &mut RunReport,
) -> Result<(), DubError> {
    pipeline::check_dependencies(&config.media)?;
    let synthesizer = synthesis_client(config, args.api_key.as_deref())?;

    let manual = match &args.transcript {
        Some(text) => ManualEntry::Text(text.clone()),
        None if std::io::stdin().is_terminal() => ManualEntry::Prompt,
        None => ManualEntry::Disabled,
    };
    let transcriber =
        Transcriber::from_config(&config.transcription, args.backend.as_deref(), manual);
    let prober = FfprobeProber::new(&config.media.ffprobe);
    let transcoder = FfmpegTranscoder::new(&config.media.ffmpeg);

    let request = DubRequest {
        video: args.video.clone(),
        output: output.to_path_buf(),
        voice_id: config.voice.voice_id.clone(),
        mode: config.timing.mode,
    };
    tracing::info!(
        "Dubbing {} -> {} ({} mode, voice {})",
        request.video.display(),
        request.output.display(),
        request.mode,
        request.voice_id
    );

    DubPipeline::new(config, &prober, &transcoder, &transcriber, &synthesizer).run(&request, report)
}

/// List the voices the configured API key can use.
pub fn list_voices(config: &Config, api_key: Option<&str>) -> Result<()> {
    let client = synthesis_client(config, api_key)?;
    let voices = client.list_voices().context("Failed to list voices")?;

    println!("Available voices:");
    for voice in &voices {
        println!("  {} ({})", voice.name, voice.voice_id);
    }
    if voices.is_empty() {
        println!("  (none)");
    }
    Ok(())
}

pub fn format_duration(secs: Option<f64>) -> String {
    match secs {
        Some(secs) => format!("{:.3}s", secs),
        None => "unknown".to_string(),
    }
}

/// Print the probed duration (and video details) of each path.
pub fn probe_paths(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let prober = FfprobeProber::new(&config.media.ffprobe);
    for path in paths {
        println!("{}: {}", path.display(), format_duration(prober.duration(path)));
        if let Some(info) = prober.video_info(path) {
            let size = match (info.width, info.height) {
                (Some(w), Some(h)) => format!("{}x{}", w, h),
                _ => "unknown size".to_string(),
            };
            println!(
                "  video: {}, {:.2}fps, {}",
                info.codec.as_deref().unwrap_or("unknown codec"),
                info.fps,
                size
            );
        }
    }
    Ok(())
}

pub fn describe_tempo(ratio: f64) -> Result<String> {
    let chain = TempoChain::plan(ratio)?;
    if chain.is_noop() {
        return Ok(format!("tempo {}: no change needed", ratio));
    }
    let filters: Vec<_> = chain.filters().collect();
    Ok(format!(
        "tempo {}: {} step(s)\n  -af {}",
        ratio,
        chain.steps().len(),
        filter::chain(&filters)
    ))
}

pub fn plan_tempo(ratio: f64) -> Result<()> {
    println!("{}", describe_tempo(ratio)?);
    Ok(())
}

pub fn print_default_config() -> Result<()> {
    print!("{}", Config::generate_default_commented());
    Ok(())
}
