pub mod compose;

use std::fmt;

use crate::media::filter::fmt_decimal;

pub use compose::compose;

/// Text for the synthesis service with embedded SSML-style break tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedScript(String);

impl AnnotatedScript {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AnnotatedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<break time="0.4s"/>`
pub fn pause(secs: f64) -> String {
    format!("<break time=\"{}s\"/>", fmt_decimal(secs, 2))
}
