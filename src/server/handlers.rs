// HTTP request handlers

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::SevaServer;
use crate::chat::{ChatError, Conversation, Message};
use crate::speech::SpeechError;
use crate::stream::{DataStreamWriter, DATA_STREAM_HEADER, DATA_STREAM_VERSION};

/// Create the main application router
pub fn create_router(server: Arc<SevaServer>) -> Router {
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/text-to-speech", post(handle_text_to_speech))
        .route("/health", get(health_check))
        .with_state(server)
}

/// Request body for /api/chat
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Handle POST /api/chat - one conversation turn as a data stream
async fn handle_chat(
    State(server): State<Arc<SevaServer>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let conversation = Conversation::from(request.messages);
    server.agent().validate(&conversation)?;

    tracing::info!(messages = conversation.len(), "Starting chat turn");

    let (writer, rx) = DataStreamWriter::channel();
    let agent = Arc::clone(server.agent());
    tokio::spawn(async move {
        agent.run(conversation, writer).await;
    });

    let body = Body::from_stream(UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (HeaderName::from_static(DATA_STREAM_HEADER), DATA_STREAM_VERSION),
        ],
        body,
    )
        .into_response())
}

/// Request body for /api/text-to-speech
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "voiceId")]
    pub voice_id: Option<String>,
}

/// Handle POST /api/text-to-speech - stream synthesized audio back
async fn handle_text_to_speech(
    State(server): State<Arc<SevaServer>>,
    request: Result<Json<SpeechRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unreadable text to speech request");
            return speech_error(StatusCode::INTERNAL_SERVER_ERROR, rejection.body_text());
        }
    };
    let text = request.text.unwrap_or_default();

    match server.speech().convert(&text, request.voice_id.as_deref()).await {
        Ok(audio) => (
            [(header::CONTENT_TYPE, "audio/mpeg")],
            Body::from_stream(audio.bytes_stream()),
        )
            .into_response(),
        Err(e) => {
            let status = match e {
                SpeechError::EmptyText => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                tracing::error!(error = %e, "Text to speech failed");
            }
            speech_error(status, e.to_string())
        }
    }
}

/// Flat `{"error": ...}` body the speech UI reads
fn speech_error(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
    pub tools: usize,
}

/// Handle GET /health - Health check endpoint
pub async fn health_check(State(server): State<Arc<SevaServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        uptime_seconds: server.uptime().as_secs(),
        tools: server.agent().registry().len(),
    })
}

/// Application error wrapper for proper HTTP error responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<ChatError>().is_some() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = if status.is_client_error() {
            tracing::warn!(error = %self.0, "Rejected request");
            "invalid_request_error"
        } else {
            tracing::error!(error = %self.0, "Request failed");
            "api_error"
        };

        let body = serde_json::json!({
            "error": {
                "message": self.0.to_string(),
                "type": error_type
            }
        });

        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
