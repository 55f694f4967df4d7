use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;

/// Frame rate assumed when the video stream cannot be inspected.
pub const FALLBACK_FPS: f64 = 30.0;

/// Reads durations (and optionally stream details) from media files.
///
/// `duration` returns `None` rather than an error: callers treat an unknown
/// duration as a signal to fall back, never as a reason to abort.
pub trait MediaProber {
    fn duration(&self, path: &Path) -> Option<f64>;

    fn video_info(&self, _path: &Path) -> Option<VideoInfo> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub fps: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec: Option<String>,
    pub profile: Option<String>,
}

pub struct FfprobeProber {
    binary: PathBuf,
}

impl FfprobeProber {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&str], path: &Path) -> Option<String> {
        let output = Command::new(&self.binary).args(args).arg(path).output();
        match output {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                tracing::debug!(
                    "ffprobe failed for {} ({}): {}",
                    path.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                tracing::debug!("Could not launch {}: {}", self.binary.display(), e);
                None
            }
        }
    }
}

impl MediaProber for FfprobeProber {
    fn duration(&self, path: &Path) -> Option<f64> {
        let stdout = self.run(
            &[
                "-v",
                "quiet",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ],
            path,
        )?;
        parse_duration(&stdout)
    }

    fn video_info(&self, path: &Path) -> Option<VideoInfo> {
        let stdout = self.run(
            &[
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ],
            path,
        )?;
        parse_video_info(&stdout)
    }
}

/// Parse the single float ffprobe prints for `format=duration`.
pub fn parse_duration(stdout: &str) -> Option<f64> {
    let secs: f64 = stdout.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs)
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct ProbeStreams {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    r_frame_rate: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    profile: Option<String>,
}

/// Parse the JSON from `ffprobe -show_streams -select_streams v:0`.
pub fn parse_video_info(json: &str) -> Option<VideoInfo> {
    let parsed: ProbeStreams = serde_json::from_str(json).ok()?;
    let stream = parsed.streams.into_iter().next()?;
    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(FALLBACK_FPS);

    Some(VideoInfo {
        fps,
        width: stream.width,
        height: stream.height,
        codec: stream.codec_name,
        profile: stream.profile,
    })
}

/// `"30000/1001"` or `"25"` to frames per second.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.trim().parse::<f64>().ok()? / den
        }
        None => raw.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}
