use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::timing::ReconcileMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub voice: VoiceConfig,
    pub timing: TimingConfig,
    pub pauses: PauseConfig,
    pub transcription: TranscriptionConfig,
    pub media: MediaConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub voice_id: String,
    pub model_id: String,
    /// ElevenLabs API key (or set ELEVEN_LABS_KEY / ELEVENLABS_API_KEY).
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceConfig")
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub mode: ReconcileMode,
    /// Ceiling for the whole-clip video speed-up in scale-video mode.
    pub max_speed_ratio: f64,
    pub min_speed_ratio: f64,
    /// Bounds on the audio stretch factor in stretch-audio mode.
    pub min_stretch: f64,
    pub max_stretch: f64,
    /// Residual mismatch tolerated before padding/trimming or warning.
    pub drift_tolerance_secs: f64,
    /// Mismatch tolerated at the final mux before an audio filter is applied.
    pub mux_tolerance_secs: f64,
}

/// Pause lengths inserted after punctuation, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunctuationPauses {
    /// After `.`, `!` and `?`.
    pub sentence: f64,
    /// After `;` and `:`.
    pub clause: f64,
    pub comma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapPolicy {
    /// Gaps above this get `long_pause`.
    pub long_gap_secs: f64,
    pub long_pause: f64,
    /// Gaps from here up to `long_gap_secs` pass through unchanged.
    pub pass_through_min_secs: f64,
    /// Gaps from here up to `pass_through_min_secs` get `medium_pause`.
    pub medium_gap_secs: f64,
    pub medium_pause: f64,
    pub short_pause: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseConfig {
    pub leading: f64,
    pub trailing: f64,
    /// Used when the transcript has at most one segment.
    #[serde(deserialize_with = "single_segment_pauses")]
    pub single: PunctuationPauses,
    /// Used inside each segment of a multi-segment transcript.
    #[serde(deserialize_with = "within_segment_pauses")]
    pub segment: PunctuationPauses,
    pub gaps: GapPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// "azure", "whisper" or "manual".
    pub backend: String,
    /// Path to a ggml model for the whisper backend.
    pub model: String,
    /// Speech rate used to estimate the duration of a manual transcript.
    pub words_per_minute: f64,
    pub azure: AzureConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .field("deployment", &self.deployment)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub extract_sample_rate: u32,
    pub extract_channels: u16,
    pub video_codec: String,
    pub video_profile: String,
    pub pixel_format: String,
    pub audio_codec: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            voice: VoiceConfig::default(),
            timing: TimingConfig::default(),
            pauses: PauseConfig::default(),
            transcription: TranscriptionConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: "UgBBYS2sOqTuMpoF3BR0".to_string(),
            model_id: "eleven_monolingual_v1".to_string(),
            api_key: String::new(),
            base_url: "https://api.elevenlabs.io".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode: ReconcileMode::ScaleVideo,
            max_speed_ratio: 2.5,
            min_speed_ratio: 0.5,
            min_stretch: 0.5,
            max_stretch: 2.0,
            drift_tolerance_secs: 0.5,
            mux_tolerance_secs: 1.0,
        }
    }
}

impl Default for PunctuationPauses {
    fn default() -> Self {
        Self::single_segment()
    }
}

/// A `[pauses.single]` / `[pauses.segment]` table where every key is optional.
#[derive(Deserialize)]
struct PunctuationOverrides {
    sentence: Option<f64>,
    clause: Option<f64>,
    comma: Option<f64>,
}

impl PunctuationOverrides {
    fn apply_to(self, base: PunctuationPauses) -> PunctuationPauses {
        PunctuationPauses {
            sentence: self.sentence.unwrap_or(base.sentence),
            clause: self.clause.unwrap_or(base.clause),
            comma: self.comma.unwrap_or(base.comma),
        }
    }
}

fn single_segment_pauses<'de, D: Deserializer<'de>>(d: D) -> Result<PunctuationPauses, D::Error> {
    PunctuationOverrides::deserialize(d).map(|o| o.apply_to(PunctuationPauses::single_segment()))
}

fn within_segment_pauses<'de, D: Deserializer<'de>>(d: D) -> Result<PunctuationPauses, D::Error> {
    PunctuationOverrides::deserialize(d).map(|o| o.apply_to(PunctuationPauses::within_segment()))
}

impl PunctuationPauses {
    pub fn single_segment() -> Self {
        Self {
            sentence: 0.4,
            clause: 0.3,
            comma: 0.2,
        }
    }

    pub fn within_segment() -> Self {
        Self {
            sentence: 0.3,
            clause: 0.2,
            comma: 0.15,
        }
    }
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            long_gap_secs: 2.0,
            long_pause: 2.0,
            pass_through_min_secs: 1.0,
            medium_gap_secs: 0.3,
            medium_pause: 0.5,
            short_pause: 0.2,
        }
    }
}

impl Default for PauseConfig {
    fn default() -> Self {
        Self {
            leading: 0.2,
            trailing: 0.3,
            single: PunctuationPauses::single_segment(),
            segment: PunctuationPauses::within_segment(),
            gaps: GapPolicy::default(),
        }
    }
}

/// Local whisper when it is compiled in, otherwise manual entry.
fn default_backend() -> &'static str {
    if cfg!(feature = "whisper") {
        "whisper"
    } else {
        "manual"
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: default_backend().to_string(),
            model: String::new(),
            words_per_minute: 150.0,
            azure: AzureConfig::default(),
        }
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            extract_sample_rate: 44100,
            extract_channels: 2,
            video_codec: "libx264".to_string(),
            video_profile: "baseline".to_string(),
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

// --- Config loading ---

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

fn check_positive(name: &str, value: f64) -> anyhow::Result<()> {
    if !value.is_finite() || value <= 0.0 {
        anyhow::bail!("{} must be a positive number, got {}", name, value);
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> anyhow::Result<()> {
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("{} must be zero or more, got {}", name, value);
    }
    Ok(())
}

impl TimingConfig {
    /// Bounds must be positive with `min <= max`; tolerances must not be negative.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_positive("timing.min_speed_ratio", self.min_speed_ratio)?;
        check_positive("timing.max_speed_ratio", self.max_speed_ratio)?;
        check_positive("timing.min_stretch", self.min_stretch)?;
        check_positive("timing.max_stretch", self.max_stretch)?;
        if self.min_speed_ratio > self.max_speed_ratio {
            anyhow::bail!(
                "timing.max_speed_ratio ({}) is below timing.min_speed_ratio ({})",
                self.max_speed_ratio,
                self.min_speed_ratio
            );
        }
        if self.min_stretch > self.max_stretch {
            anyhow::bail!(
                "timing.max_stretch ({}) is below timing.min_stretch ({})",
                self.max_stretch,
                self.min_stretch
            );
        }
        check_non_negative("timing.drift_tolerance_secs", self.drift_tolerance_secs)?;
        check_non_negative("timing.mux_tolerance_secs", self.mux_tolerance_secs)?;
        Ok(())
    }
}

impl Config {
    /// Load config and return the resolved file path (if any).
    pub fn load_with_path(path: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        // 1. Explicit path
        if let Some(p) = path {
            return Ok((read_config(p)?, Some(p.to_path_buf())));
        }

        // 2. Working directory, then beside the executable
        let mut candidates = vec![PathBuf::from("redub.toml")];
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(dir) = exe_path.parent() {
                candidates.push(dir.join("redub.toml"));
            }
        }

        // 3. Platform config directory (e.g. ~/.config/redub/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("redub").join("config.toml"));
        }

        for candidate in candidates {
            if candidate.exists() {
                tracing::debug!("Using config file {}", candidate.display());
                return Ok((read_config(&candidate)?, Some(candidate)));
            }
        }

        // 4. Fall back to defaults
        tracing::debug!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.timing.validate()?;
        check_positive("transcription.words_per_minute", self.transcription.words_per_minute)
    }

    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    /// Generate a default config file with all fields and inline documentation.
    pub fn generate_default_commented() -> String {
        r#"# redub configuration
# Every value shown is the built-in default; delete lines you don't change.

[voice]
# ElevenLabs voice ID used for synthesis (list them with `redub voices`).
voice_id = "UgBBYS2sOqTuMpoF3BR0"
# ElevenLabs model ID.
model_id = "eleven_monolingual_v1"
# API key (or set ELEVEN_LABS_KEY, falling back to ELEVENLABS_API_KEY).
# api_key = ""
base_url = "https://api.elevenlabs.io"

[timing]
# "scale-video": speed the whole video up/down to fit the new voice.
# "stretch-audio": time-stretch the new voice to the original speech length
# and keep the original video timing.
mode = "scale-video"
# Bounds on the video speed factor in scale-video mode.
max_speed_ratio = 2.5
min_speed_ratio = 0.5
# Bounds on the audio stretch factor in stretch-audio mode.
min_stretch = 0.5
max_stretch = 2.0
# Residual mismatch (seconds) tolerated before padding/trimming or warning.
drift_tolerance_secs = 0.5
# Mismatch (seconds) tolerated at the final mux before the audio is padded
# or trimmed; below it the mux just stops at the shorter stream.
mux_tolerance_secs = 1.0

[pauses]
# Pauses (seconds) at the very start and end of the synthesis script.
leading = 0.2
trailing = 0.3

[pauses.single]
# Pauses after punctuation when the transcript has a single segment.
sentence = 0.4
clause = 0.3
comma = 0.2

[pauses.segment]
# Pauses after punctuation inside each segment of a multi-segment transcript.
sentence = 0.3
clause = 0.2
comma = 0.15

[pauses.gaps]
# Silence between segments is mapped to a pause:
#   gap > long_gap_secs                         -> long_pause
#   pass_through_min_secs <= gap <= long_gap_secs -> the gap itself
#   medium_gap_secs <= gap < pass_through_min_secs -> medium_pause
#   gap < medium_gap_secs                       -> short_pause
long_gap_secs = 2.0
long_pause = 2.0
pass_through_min_secs = 1.0
medium_gap_secs = 0.3
medium_pause = 0.5
short_pause = 0.2

[transcription]
# "azure" (Azure OpenAI Whisper), "whisper" (local, needs the `whisper`
# feature) or "manual" (type the transcript when prompted). Defaults to
# "whisper" when built with the `whisper` feature, otherwise "manual".
# backend = "manual"
# Path to a ggml model file for the whisper backend.
model = ""
# Speech rate used to estimate timing of a manually entered transcript.
words_per_minute = 150.0

[transcription.azure]
# endpoint = "https://your-resource.openai.azure.com"
# API key (or set REDUB_AZURE_KEY environment variable).
# api_key = ""
# deployment = "whisper"

[media]
ffmpeg = "ffmpeg"
ffprobe = "ffprobe"
# Format of the audio extracted for transcription.
extract_sample_rate = 44100
extract_channels = 2
# Encoding used whenever the video has to be re-encoded.
video_codec = "libx264"
video_profile = "baseline"
pixel_format = "yuv420p"
audio_codec = "aac"
"#
        .to_string()
    }
}
