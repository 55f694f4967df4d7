use std::path::Path;

use anyhow::Result;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::transcribe::backend::{Transcript, TranscriptSegment, TranscriptionBackend};

/// Sample rate whisper.cpp expects.
const WHISPER_SAMPLE_RATE: u32 = 16000;

pub struct WhisperLocal {
    ctx: WhisperContext,
}

impl WhisperLocal {
    pub fn new(model_path: &str) -> Result<Self> {
        if model_path.is_empty() {
            anyhow::bail!("Whisper model not configured. Set [transcription] model");
        }
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| anyhow::anyhow!("Failed to load Whisper model: {:?}", e))?;
        Ok(Self { ctx })
    }
}

impl TranscriptionBackend for WhisperLocal {
    fn name(&self) -> &str {
        "whisper-local"
    }

    fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let mut reader = hound::WavReader::open(audio_path)?;
        let spec = reader.spec();
        let samples_i16: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mono = downmix(&samples_i16, spec.channels);
        let samples = resample_linear(&mono, spec.sample_rate, WHISPER_SAMPLE_RATE);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| anyhow::anyhow!("Failed to create state: {:?}", e))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(4);
        params.set_language(Some("en"));

        state
            .full(params, &samples)
            .map_err(|e| anyhow::anyhow!("Transcription failed: {:?}", e))?;

        let mut segments = Vec::new();
        let n_segments = state.full_n_segments();
        for i in 0..n_segments {
            if let Some(segment) = state.get_segment(i) {
                if let Ok(text) = segment.to_str_lossy() {
                    // Timestamps are in centiseconds.
                    let start = segment.start_timestamp() as f64 / 100.0;
                    let end = segment.end_timestamp() as f64 / 100.0;
                    segments.push(TranscriptSegment::new(text.trim(), start, end));
                }
            }
        }

        Ok(Transcript::from_segments(segments))
    }
}

/// Average interleaved i16 frames into mono f32 in [-1.0, 1.0].
fn downmix(samples: &[i16], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    samples
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| s as f32 / 32768.0).sum();
            sum / frame.len() as f32
        })
        .collect()
}

fn resample_linear(samples: &[f32], from_hz: u32, to_hz: u32) -> Vec<f32> {
    if from_hz == to_hz || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from_hz as f64 / to_hz as f64;
    let out_len = (samples.len() as f64 / ratio).floor() as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx];
            let b = samples.get(idx + 1).copied().unwrap_or(a);
            a + (b - a) * frac
        })
        .collect()
}
