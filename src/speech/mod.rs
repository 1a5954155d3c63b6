// Text to speech via the ElevenLabs REST API
//
// Stateless pass-through: the caller streams the provider's audio straight to
// its own client.

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::{SpeechConfig, VoiceSettings};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_ERROR: &str = "Failed to convert text to speech.";

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Text is required")]
    EmptyText,

    #[error("Text to speech is not configured: set ELEVENLABS_API_KEY")]
    NotConfigured,

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to reach speech provider: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

pub struct SpeechClient {
    client: Client,
    config: SpeechConfig,
}

impl SpeechClient {
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Start converting `text`; the returned response body is the audio.
    ///
    /// `voice_id` overrides the configured voice when present and non-empty.
    pub async fn convert(&self, text: &str, voice_id: Option<&str>) -> Result<Response, SpeechError> {
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let api_key = self.config.api_key.as_deref().ok_or(SpeechError::NotConfigured)?;

        let voice_id = voice_id
            .filter(|voice| !voice.is_empty())
            .unwrap_or(&self.config.voice_id);
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.api_url.trim_end_matches('/'),
            voice_id
        );

        tracing::debug!(%voice_id, chars = text.len(), "Requesting speech synthesis");

        let response = self
            .client
            .post(url)
            .query(&[("output_format", self.config.output_format.as_str())])
            .header("xi-api-key", api_key)
            .json(&ConvertRequest {
                text,
                model_id: &self.config.model_id,
                voice_settings: &self.config.voice_settings,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_message(&body);
            tracing::error!(status = status.as_u16(), %message, "ElevenLabs API error");
            return Err(SpeechError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Most specific error text in a provider error body: `detail` wins over `message`
fn upstream_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return DEFAULT_ERROR.to_string();
    };

    let detail = value.get("detail");
    detail
        .and_then(Value::as_str)
        .or_else(|| detail.and_then(|d| d.get("message")).and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str))
        .unwrap_or(DEFAULT_ERROR)
        .to_string()
}
