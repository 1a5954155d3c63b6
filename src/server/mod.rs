// Seva HTTP server
// Chat, text-to-speech and health endpoints

mod handlers;

pub use handlers::{create_router, health_check, AppError, ChatRequest, HealthStatus, SpeechRequest};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::ChatAgent;
use crate::errors::UserFriendlyError;
use crate::speech::SpeechClient;

/// Shared state behind every request
pub struct SevaServer {
    agent: Arc<ChatAgent>,
    speech: Arc<SpeechClient>,
    started_at: Instant,
}

impl SevaServer {
    pub fn new(agent: ChatAgent, speech: SpeechClient) -> Self {
        Self {
            agent: Arc::new(agent),
            speech: Arc::new(speech),
            started_at: Instant::now(),
        }
    }

    /// Router with tracing and CORS layers applied
    pub fn into_router(self) -> axum::Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(Arc::new(self))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP server
    pub async fn serve(self, bind_address: &str) -> Result<()> {
        let addr: SocketAddr = bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", bind_address))?;

        let app = self.into_router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(anyhow::Error::from)
            .user_context_with_suggestion(
                &format!("Failed to bind {}", addr),
                "Is another server already running? Try a different --bind address.",
            )?;

        tracing::info!("Starting Seva server on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }

    pub fn agent(&self) -> &Arc<ChatAgent> {
        &self.agent
    }

    pub fn speech(&self) -> &Arc<SpeechClient> {
        &self.speech
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
