use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::multipart;
use serde::Deserialize;

use crate::config::AzureConfig;
use crate::transcribe::backend::{Transcript, TranscriptSegment, TranscriptionBackend};

pub struct AzureOpenAIBackend {
    endpoint: String,
    api_key: String,
    deployment: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

impl AzureOpenAIBackend {
    pub fn new(config: &AzureConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            anyhow::bail!("Azure endpoint not configured. Set [transcription.azure] endpoint");
        }
        if config.deployment.is_empty() {
            anyhow::bail!("Azure deployment not configured. Set [transcription.azure] deployment");
        }
        let api_key = if config.api_key.is_empty() {
            std::env::var("REDUB_AZURE_KEY").map_err(|_| {
                anyhow::anyhow!(
                    "Azure API key not configured. Set [transcription.azure] api_key or REDUB_AZURE_KEY"
                )
            })?
        } else {
            config.api_key.clone()
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            deployment: config.deployment.clone(),
            client,
        })
    }
}

impl TranscriptionBackend for AzureOpenAIBackend {
    fn name(&self) -> &str {
        "azure-openai"
    }

    fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let url = format!(
            "{}/openai/deployments/{}/audio/transcriptions?api-version=2024-06-01",
            self.endpoint, self.deployment
        );

        let file_bytes = std::fs::read(audio_path)
            .with_context(|| format!("Failed to read {}", audio_path.display()))?;
        let filename = audio_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("audio path has no filename: {}", audio_path.display()))?
            .to_string_lossy()
            .to_string();

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(file_bytes)
                    .file_name(filename)
                    .mime_str("audio/wav")?,
            )
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .context("Failed to send transcription request")?;

        let response = response.error_for_status()?;
        let body: VerboseTranscription = response
            .json()
            .context("Failed to parse transcription response")?;

        Ok(into_transcript(body))
    }
}

fn into_transcript(body: VerboseTranscription) -> Transcript {
    if body.segments.is_empty() {
        // No timing came back: treat the whole clip as one segment.
        let end = body.duration.unwrap_or(0.0);
        return Transcript::from_segments(vec![TranscriptSegment::new(
            body.text.trim(),
            0.0,
            end,
        )]);
    }

    let segments = body
        .segments
        .into_iter()
        .map(|s| TranscriptSegment::new(s.text.trim(), s.start, s.end))
        .collect();
    Transcript::from_segments(segments)
}
