use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One timed stretch of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

impl TranscriptSegment {
    /// `end` is raised to `start` if it comes earlier.
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        let end = end.max(start);
        Self {
            text: text.into(),
            start,
            end,
            duration: end - start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub full_text: String,
    pub segments: Vec<TranscriptSegment>,
    /// End of the last segment, i.e. how long the original speech ran.
    pub total_duration: f64,
}

impl Transcript {
    /// Build a transcript from segments in any order.
    pub fn from_segments(mut segments: Vec<TranscriptSegment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        let full_text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let total_duration = segments.iter().map(|s| s.end).fold(0.0, f64::max);
        Self {
            full_text,
            segments,
            total_duration,
        }
    }

    /// A single-segment transcript whose length is estimated from its word
    /// count at `words_per_minute`.
    pub fn from_manual_text(text: &str, words_per_minute: f64) -> Self {
        let text = text.trim();
        let words = text.split_whitespace().count();
        let estimated = words as f64 / words_per_minute * 60.0;
        Self::from_segments(vec![TranscriptSegment::new(text, 0.0, estimated)])
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.full_text.split_whitespace().count()
    }
}

pub trait TranscriptionBackend {
    fn name(&self) -> &str;
    fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}
