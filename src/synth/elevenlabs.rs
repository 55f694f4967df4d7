use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::VoiceConfig;
use crate::script::AnnotatedScript;
use crate::synth::{SpeechSynthesizer, Voice};

/// ElevenLabs REST client.
///
/// API reference: POST {base}/v1/text-to-speech/{voice_id}, GET {base}/v1/voices
pub struct ElevenLabsClient {
    base_url: Url,
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for ElevenLabsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("model_id", &self.model_id)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

impl ElevenLabsClient {
    pub fn new(config: &VoiceConfig, api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!(
                "ElevenLabs API key not provided. Pass --api-key, set [voice] api_key, or export ELEVEN_LABS_KEY"
            );
        }
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid ElevenLabs base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid ElevenLabs base URL: {}", config.base_url);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            model_id: config.model_id.clone(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn list_voices(&self) -> Result<Vec<Voice>> {
        let url = self.endpoint(&["v1", "voices"]);
        let response = self
            .client
            .get(url)
            .header("xi-api-key", &self.api_key)
            .send()
            .context("Failed to send voices request to ElevenLabs")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("ElevenLabs returned {}: {}", status, body.trim());
        }

        let body: VoicesResponse = response
            .json()
            .context("Failed to parse ElevenLabs voices response")?;
        Ok(body.voices)
    }
}

impl SpeechSynthesizer for ElevenLabsClient {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn synthesize(&self, script: &AnnotatedScript, voice_id: &str) -> Result<Vec<u8>> {
        if voice_id.trim().is_empty() {
            anyhow::bail!("No voice selected");
        }
        let url = self.endpoint(&["v1", "text-to-speech", voice_id]);
        let request = SpeechRequest {
            text: script.as_str(),
            model_id: &self.model_id,
        };

        tracing::info!(
            "Requesting speech from ElevenLabs (voice {}, model {})",
            voice_id,
            self.model_id
        );
        tracing::debug!("Synthesis script: {}", script);

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .context("Failed to send synthesis request to ElevenLabs")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("ElevenLabs returned {}: {}", status, body.trim());
        }

        let audio = response
            .bytes()
            .context("Failed to read synthesized audio")?
            .to_vec();
        if audio.is_empty() {
            anyhow::bail!("ElevenLabs returned an empty audio body");
        }
        Ok(audio)
    }
}
