// HTTP client for Claude API

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use super::retry::with_retry;
use super::types::{MessageRequest, MessageResponse};
use super::LlmProvider;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Non-success response from the Claude API
#[derive(Debug, Error)]
#[error("Claude API request failed\n\nStatus: {status}\nBody: {body}")]
pub struct ApiError {
    pub status: u16,
    pub body: String,
}

impl ApiError {
    /// Rate limits, overload and server errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

pub struct ClaudeClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            api_url: CLAUDE_API_URL.to_string(),
        })
    }

    /// Point the client at a different Messages endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Send a single message request (no retry)
    async fn send_message_once(&self, request: &MessageRequest) -> Result<MessageResponse> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending request to Claude API"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .context("Failed to send request to Claude API")?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .context("Failed to parse Claude API response")?;

        tracing::debug!(
            id = %message_response.id,
            stop_reason = ?message_response.stop_reason,
            "Received response"
        );

        Ok(message_response)
    }
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    /// Send a message to Claude API with retry logic
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        with_retry(move || self.send_message_once(request)).await
    }

    fn name(&self) -> &str {
        "claude"
    }
}
