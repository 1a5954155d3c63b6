// Grievance backend (GRM) client
//
// Two endpoints: `/category` classifies free text into a department and
// category, `/grievances` files a grievance on behalf of the configured user.

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::GrmConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Non-success response from the grievance backend
#[derive(Debug, Error)]
#[error("{message}")]
pub struct GrmError {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Fields the model supplies when filing a grievance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGrievance {
    pub title: String,
    pub description: String,
    pub category: String,
    pub cpgrams_category: String,
    pub priority: Priority,
}

#[derive(Serialize)]
struct CreateGrievancePayload<'a> {
    #[serde(flatten)]
    grievance: &'a NewGrievance,
    user_id: &'a str,
}

pub struct GrmClient {
    client: Client,
    api_url: String,
    api_token: String,
    user_id: String,
}

impl GrmClient {
    pub fn new(config: &GrmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            user_id: config.user_id.clone(),
        })
    }

    /// Ask the backend which department and category fit `query`
    pub async fn classify(&self, query: &str) -> Result<Value> {
        tracing::debug!(chars = query.len(), "Classifying grievance");

        let response = self
            .client
            .post(format!("{}/category", self.api_url))
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ "grievance_text": query }))
            .send()
            .await
            .context("Failed to reach grievance backend")?;

        parse_response(response, "Failed to classify grievance").await
    }

    /// File a grievance for the configured user
    pub async fn create_grievance(&self, grievance: &NewGrievance) -> Result<Value> {
        tracing::info!(
            title = %grievance.title,
            category = %grievance.category,
            priority = ?grievance.priority,
            "Submitting grievance"
        );

        let payload = CreateGrievancePayload {
            grievance,
            user_id: &self.user_id,
        };

        let response = self
            .client
            .post(format!("{}/grievances", self.api_url))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach grievance backend")?;

        parse_response(response, "Failed to submit grievance").await
    }
}

/// Body as JSON on success; on failure the body's `message` or `fallback`
async fn parse_response(response: Response, fallback: &str) -> Result<Value> {
    let status = response.status();

    if !status.is_success() {
        let body: Option<Value> = response.json().await.ok();
        let message = body
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(fallback)
            .to_string();

        tracing::warn!(status = status.as_u16(), %message, "Grievance backend returned an error");
        return Err(GrmError {
            status: status.as_u16(),
            message,
        }
        .into());
    }

    response
        .json()
        .await
        .context("Failed to parse grievance backend response")
}
