// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors;
use crate::tools::FailurePolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub grm: GrmConfig,
    pub scheme_search: SchemeSearchConfig,
    pub speech: SpeechConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Check what `serve` cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.trim().is_empty() {
            bail!(errors::api_key_missing_error("Anthropic", "ANTHROPIC_API_KEY"));
        }
        if self.grm.api_url.trim().is_empty() {
            bail!(errors::grm_url_missing_error());
        }
        if self.model.max_steps == 0 {
            bail!("model.max_steps must be at least 1");
        }
        Ok(())
    }
}

/// Language model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Anthropic API key
    pub api_key: String,

    pub model: String,

    /// Model calls per chat turn
    pub max_steps: usize,

    pub max_tokens: u32,

    /// Replaces the built-in system prompt when set
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-3-5-haiku-20241022".to_string(),
            max_steps: 3,
            max_tokens: 4096,
            system_prompt_path: None,
        }
    }
}

/// Grievance backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrmConfig {
    pub api_url: String,
    pub api_token: String,
    /// Owner recorded on every grievance this deployment files
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeSearchConfig {
    pub api_url: Option<String>,
}

/// ElevenLabs text-to-speech settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub voice_settings: VoiceSettings,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.elevenlabs.io".to_string(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000")
    pub bind_address: String,

    /// How a failing confirmed tool affects the turn
    pub executor_failure: FailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            executor_failure: FailurePolicy::Isolate,
        }
    }
}
