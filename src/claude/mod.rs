// Claude API client module
// Public interface for interacting with Anthropic Claude API

mod client;
pub(crate) mod retry;
mod types;

pub use client::{ApiError, ClaudeClient};
pub use types::{ContentBlock, Message, MessageRequest, MessageResponse, Usage};

use anyhow::Result;
use async_trait::async_trait;

/// Trait for the model backing the chat endpoint
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a message and get a complete response
    async fn send_message(&self, request: &MessageRequest) -> Result<MessageResponse>;

    /// Get the provider name (e.g., "claude")
    fn name(&self) -> &str;
}
