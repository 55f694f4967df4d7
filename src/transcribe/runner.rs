use std::path::Path;

use anyhow::Result;

use crate::config::TranscriptionConfig;
use crate::error::DubError;
use crate::transcribe::backend::{Transcript, TranscriptionBackend};
use crate::transcribe::manual::ManualEntry;

/// Build the configured backend. `Ok(None)` means manual entry only.
pub fn build_backend(
    config: &TranscriptionConfig,
    backend_override: Option<&str>,
) -> Result<Option<Box<dyn TranscriptionBackend>>> {
    let backend_name = backend_override.unwrap_or(&config.backend);

    match backend_name {
        "manual" | "none" => Ok(None),
        "whisper" | "local" => {
            #[cfg(feature = "whisper")]
            {
                use crate::transcribe::whisper_local::WhisperLocal;
                Ok(Some(Box::new(WhisperLocal::new(&config.model)?)))
            }
            #[cfg(not(feature = "whisper"))]
            {
                anyhow::bail!("Local whisper backend requires building with the `whisper` feature")
            }
        }
        "azure" => {
            use crate::transcribe::azure_openai::AzureOpenAIBackend;
            Ok(Some(Box::new(AzureOpenAIBackend::new(&config.azure)?)))
        }
        other => anyhow::bail!("Unknown transcription backend: {}", other),
    }
}

/// Produces a transcript from an automatic backend when one is available,
/// falling back to manual entry otherwise.
pub struct Transcriber {
    backend: Option<Box<dyn TranscriptionBackend>>,
    manual: ManualEntry,
    words_per_minute: f64,
}

impl Transcriber {
    pub fn new(
        backend: Option<Box<dyn TranscriptionBackend>>,
        manual: ManualEntry,
        words_per_minute: f64,
    ) -> Self {
        Self {
            backend,
            manual,
            words_per_minute,
        }
    }

    /// A backend that fails to initialise is reported and skipped.
    pub fn from_config(
        config: &TranscriptionConfig,
        backend_override: Option<&str>,
        manual: ManualEntry,
    ) -> Self {
        let backend = match build_backend(config, backend_override) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!("Transcription backend unavailable: {:#}", e);
                None
            }
        };
        Self::new(backend, manual, config.words_per_minute)
    }

    pub fn transcribe(&self, audio_path: &Path) -> Result<Transcript, DubError> {
        if let ManualEntry::Text(text) = &self.manual {
            tracing::info!("Using the supplied transcript");
            return self.manual_transcript(Some(text.clone()));
        }

        match &self.backend {
            Some(backend) => {
                tracing::info!("Transcribing with {}", backend.name());
                match backend.transcribe(audio_path) {
                    Ok(transcript) if !transcript.is_empty() => {
                        tracing::info!("Transcription: {}", transcript.full_text);
                        tracing::info!(
                            "Found {} segments over {:.2} seconds",
                            transcript.segments.len(),
                            transcript.total_duration
                        );
                        return Ok(transcript);
                    }
                    Ok(_) => tracing::warn!("{} returned no speech", backend.name()),
                    Err(e) => tracing::warn!("{} failed: {:#}", backend.name(), e),
                }
            }
            None => tracing::info!("No automatic transcription backend configured"),
        }

        let text = self
            .manual
            .read()
            .map_err(|e| DubError::TranscriptMissing(format!("{:#}", e)))?;
        self.manual_transcript(text)
    }

    fn manual_transcript(&self, text: Option<String>) -> Result<Transcript, DubError> {
        let transcript = text
            .map(|t| Transcript::from_manual_text(&t, self.words_per_minute))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DubError::TranscriptMissing("no transcript was entered".to_string()))?;
        tracing::info!(
            "Manual transcript: {} words, estimated {:.2} seconds",
            transcript.word_count(),
            transcript.total_duration
        );
        Ok(transcript)
    }
}
