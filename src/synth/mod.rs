pub mod credentials;
pub mod elevenlabs;

use anyhow::Result;
use serde::Deserialize;

use crate::script::AnnotatedScript;

pub use credentials::resolve_api_key;
pub use elevenlabs::ElevenLabsClient;

/// A voice offered by the synthesis service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
}

pub trait SpeechSynthesizer {
    fn name(&self) -> &str;
    /// Render `script` with `voice_id`, returning encoded audio bytes.
    fn synthesize(&self, script: &AnnotatedScript, voice_id: &str) -> Result<Vec<u8>>;
}
