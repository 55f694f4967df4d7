use std::fmt;

/// A single ffmpeg audio filter directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioFilter {
    /// Pitch-preserving tempo change; ffmpeg accepts 0.5..=2.0 per instance.
    Tempo(f64),
    /// Pad with trailing silence until the stream lasts this many seconds.
    PadTo(f64),
    /// Cut the stream at this many seconds.
    TrimTo(f64),
}

impl fmt::Display for AudioFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tempo(ratio) => write!(f, "atempo={}", fmt_decimal(*ratio, 6)),
            Self::PadTo(secs) => write!(f, "apad=whole_dur={}", fmt_decimal(*secs, 3)),
            Self::TrimTo(secs) => write!(f, "atrim=duration={}", fmt_decimal(*secs, 3)),
        }
    }
}

/// Join filters into an ffmpeg filter-chain argument (`a,b,c`).
pub fn chain(filters: &[AudioFilter]) -> String {
    filters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Format with at most `precision` decimals, dropping trailing zeros but
/// always keeping one digit after the point (`2.0`, `0.833333`, `1.5`).
pub fn fmt_decimal(value: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.push('0');
        }
    }
    s
}
