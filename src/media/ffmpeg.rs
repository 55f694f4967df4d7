use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::media::filter::{self, fmt_decimal, AudioFilter};
use crate::media::MediaError;

/// Lines of ffmpeg stderr kept in a failure diagnostic.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct JobInput {
    pub path: PathBuf,
    /// `-itsscale` factor applied to this input's timestamps.
    pub time_scale: Option<f64>,
}

/// Re-encode settings for the video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEncoding {
    pub codec: String,
    pub profile: String,
    pub pixel_format: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutput {
    /// Leave the choice to ffmpeg.
    Default,
    /// Drop video entirely (`-vn`).
    Disabled,
    /// Stream copy (`-c:v copy`).
    Copy,
    Encode(VideoEncoding),
}

/// One ffmpeg invocation, described as data so it can be inspected before
/// (or instead of) running it.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegJob {
    pub inputs: Vec<JobInput>,
    pub maps: Vec<String>,
    pub video: VideoOutput,
    pub audio_codec: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub audio_filters: Vec<AudioFilter>,
    pub shortest: bool,
    pub faststart: bool,
    pub format: Option<String>,
    pub output: PathBuf,
}

impl FfmpegJob {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            maps: Vec::new(),
            video: VideoOutput::Default,
            audio_codec: None,
            sample_rate: None,
            channels: None,
            audio_filters: Vec::new(),
            shortest: false,
            faststart: false,
            format: None,
            output: output.into(),
        }
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(JobInput {
            path: path.into(),
            time_scale: None,
        });
        self
    }

    pub fn scaled_input(mut self, path: impl Into<PathBuf>, time_scale: f64) -> Self {
        self.inputs.push(JobInput {
            path: path.into(),
            time_scale: Some(time_scale),
        });
        self
    }

    pub fn map(mut self, spec: &str) -> Self {
        self.maps.push(spec.to_string());
        self
    }

    pub fn video(mut self, video: VideoOutput) -> Self {
        self.video = video;
        self
    }

    pub fn audio_codec(mut self, codec: &str) -> Self {
        self.audio_codec = Some(codec.to_string());
        self
    }

    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate = Some(hz);
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn audio_filters(mut self, filters: impl IntoIterator<Item = AudioFilter>) -> Self {
        self.audio_filters.extend(filters);
        self
    }

    pub fn shortest(mut self) -> Self {
        self.shortest = true;
        self
    }

    pub fn faststart(mut self) -> Self {
        self.faststart = true;
        self
    }

    pub fn format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Command-line arguments for this job, not including the binary.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();

        for input in &self.inputs {
            if let Some(scale) = input.time_scale {
                args.push("-itsscale".into());
                args.push(fmt_decimal(scale, 6).into());
            }
            args.push("-i".into());
            args.push(input.path.as_os_str().to_owned());
        }

        match &self.video {
            VideoOutput::Default => {}
            VideoOutput::Disabled => args.push("-vn".into()),
            VideoOutput::Copy => {
                args.push("-c:v".into());
                args.push("copy".into());
            }
            VideoOutput::Encode(encoding) => {
                args.push("-c:v".into());
                args.push(encoding.codec.as_str().into());
                args.push("-profile:v".into());
                args.push(encoding.profile.as_str().into());
                args.push("-pix_fmt".into());
                args.push(encoding.pixel_format.as_str().into());
            }
        }

        if let Some(codec) = &self.audio_codec {
            args.push("-c:a".into());
            args.push(codec.as_str().into());
        }
        if let Some(hz) = self.sample_rate {
            args.push("-ar".into());
            args.push(hz.to_string().into());
        }
        if let Some(channels) = self.channels {
            args.push("-ac".into());
            args.push(channels.to_string().into());
        }
        for spec in &self.maps {
            args.push("-map".into());
            args.push(spec.as_str().into());
        }
        if !self.audio_filters.is_empty() {
            args.push("-af".into());
            args.push(filter::chain(&self.audio_filters).into());
        }
        if self.shortest {
            args.push("-shortest".into());
        }
        if self.faststart {
            args.push("-movflags".into());
            args.push("+faststart".into());
        }
        if let Some(format) = &self.format {
            args.push("-f".into());
            args.push(format.as_str().into());
        }
        args.push("-y".into());
        args.push(self.output.as_os_str().to_owned());
        args
    }
}

/// Runs ffmpeg jobs. Implementations block until the job finishes.
pub trait MediaTranscoder {
    fn run(&self, job: &FfmpegJob) -> Result<(), MediaError>;
}

pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn tool_name(&self) -> String {
        Path::new(&self.binary)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ffmpeg".to_string())
    }
}

impl MediaTranscoder for FfmpegTranscoder {
    fn run(&self, job: &FfmpegJob) -> Result<(), MediaError> {
        let args = job.args();
        tracing::debug!(
            "Running {} {}",
            self.binary.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|source| MediaError::Spawn {
                tool: self.tool_name(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(MediaError::Failed {
                tool: self.tool_name(),
                code: output.status.code(),
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            })
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
