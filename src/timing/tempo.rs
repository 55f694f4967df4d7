use crate::error::TimingError;
use crate::media::AudioFilter;

/// Operating range of a single ffmpeg `atempo` instance.
pub const MIN_STEP: f64 = 0.5;
pub const MAX_STEP: f64 = 2.0;

/// A tempo change split into steps that each fit one `atempo` instance.
///
/// The product of the steps equals the requested ratio. A ratio of exactly
/// 1.0 yields no steps, in which case no filter should be run at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TempoChain {
    steps: Vec<f64>,
}

impl TempoChain {
    pub fn plan(ratio: f64) -> Result<Self, TimingError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(TimingError::InvalidRatio(ratio));
        }

        let mut steps = Vec::new();
        let mut remaining = ratio;

        while remaining > MAX_STEP {
            steps.push(MAX_STEP);
            remaining /= MAX_STEP;
        }
        while remaining < MIN_STEP {
            steps.push(MIN_STEP);
            remaining /= MIN_STEP;
        }
        if remaining != 1.0 {
            steps.push(remaining);
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn product(&self) -> f64 {
        self.steps.iter().product()
    }

    pub fn filters(&self) -> impl Iterator<Item = AudioFilter> + '_ {
        self.steps.iter().map(|&step| AudioFilter::Tempo(step))
    }
}
