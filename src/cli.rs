use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::timing::ReconcileMode;

#[derive(Parser, Debug)]
#[command(
    name = "redub",
    version,
    about = "Re-voice spoken videos with synthesized speech, keeping picture and sound in sync"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace the voice in a video
    Dub(DubArgs),

    /// List the voices available to your API key
    Voices {
        /// ElevenLabs API key (or set ELEVEN_LABS_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Print the duration of media files
    Probe {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show the atempo steps for a tempo ratio
    PlanTempo {
        #[arg(allow_negative_numbers = true)]
        ratio: f64,
    },

    /// Print a commented default config file
    InitConfig,
}

#[derive(Args, Debug, Clone)]
pub struct DubArgs {
    /// Input video file
    pub video: PathBuf,

    /// Output video file (default: <video>_voice_changed.mp4)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// ElevenLabs voice ID
    #[arg(short, long)]
    pub voice: Option<String>,

    /// How to reconcile the new voice with the video
    #[arg(long, value_enum, conflicts_with = "no_adjust_video")]
    pub mode: Option<ReconcileMode>,

    /// Keep the original video timing (same as --mode stretch-audio)
    #[arg(long)]
    pub no_adjust_video: bool,

    /// Maximum video speed-up in scale-video mode
    #[arg(long, allow_negative_numbers = true)]
    pub max_speed_ratio: Option<f64>,

    /// ElevenLabs API key (or set ELEVEN_LABS_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Transcription backend (azure, whisper or manual)
    #[arg(long)]
    pub backend: Option<String>,

    /// Use this text instead of transcribing the audio
    #[arg(long)]
    pub transcript: Option<String>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl DubArgs {
    /// The mode from the flags, if either was given.
    pub fn mode_override(&self) -> Option<ReconcileMode> {
        if self.no_adjust_video {
            Some(ReconcileMode::StretchAudio)
        } else {
            self.mode
        }
    }
}
