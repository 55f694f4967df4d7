//! Turns a timed transcript into a pause-annotated synthesis script.
//!
//! A single-segment transcript carries no usable timing, so pauses are placed
//! purely by punctuation. With several segments the silence between them is
//! mapped to a pause through [`gap_pause`], approximating the speaker's rhythm.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::{GapPolicy, PauseConfig, PunctuationPauses};
use crate::script::{pause, AnnotatedScript};
use crate::transcribe::Transcript;

struct Punctuation {
    sentence: Regex,
    clause: Regex,
    comma: Regex,
}

fn punctuation() -> &'static Punctuation {
    static PATTERNS: OnceLock<Punctuation> = OnceLock::new();
    PATTERNS.get_or_init(|| Punctuation {
        sentence: Regex::new(r"([.!?])\s+").expect("static sentence pattern"),
        clause: Regex::new(r"([;:])\s+").expect("static clause pattern"),
        comma: Regex::new(r"(,)\s+").expect("static comma pattern"),
    })
}

/// Insert a pause after each punctuation mark that is followed by whitespace.
fn annotate(text: &str, pauses: &PunctuationPauses) -> String {
    let p = punctuation();
    let text = p
        .sentence
        .replace_all(text, format!("${{1}} {} ", pause(pauses.sentence)).as_str())
        .into_owned();
    let text = p
        .comma
        .replace_all(&text, format!("${{1}} {} ", pause(pauses.comma)).as_str())
        .into_owned();
    p.clause
        .replace_all(&text, format!("${{1}} {} ", pause(pauses.clause)).as_str())
        .into_owned()
}

/// Pause length for the silence between two segments.
pub fn gap_pause(gap_secs: f64, policy: &GapPolicy) -> f64 {
    if gap_secs > policy.long_gap_secs {
        policy.long_pause
    } else if gap_secs >= policy.pass_through_min_secs {
        gap_secs
    } else if gap_secs >= policy.medium_gap_secs {
        policy.medium_pause
    } else {
        policy.short_pause
    }
}

pub fn compose(transcript: &Transcript, config: &PauseConfig) -> AnnotatedScript {
    let body = if transcript.segments.len() <= 1 {
        annotate(transcript.full_text.trim(), &config.single)
    } else {
        compose_segments(transcript, config)
    };

    AnnotatedScript(format!(
        "{} {} {}",
        pause(config.leading),
        body,
        pause(config.trailing)
    ))
}

fn compose_segments(transcript: &Transcript, config: &PauseConfig) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(transcript.segments.len() * 2);

    for (i, segment) in transcript.segments.iter().enumerate() {
        let text = segment.text.trim();
        if !text.is_empty() {
            parts.push(annotate(text, &config.segment));
        }
        if let Some(next) = transcript.segments.get(i + 1) {
            let gap = next.start - segment.end;
            parts.push(pause(gap_pause(gap, &config.gaps)));
        }
    }

    parts.join(" ")
}
