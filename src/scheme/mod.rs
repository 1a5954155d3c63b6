// Government scheme search
//
// Queries a search endpoint over myscheme.gov.in content so the assistant can
// answer scheme questions before a grievance is filed.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::SchemeSearchConfig;

const REQUEST_TIMEOUT_SECS: u64 = 15;

pub struct SchemeSearchClient {
    client: Client,
    api_url: Option<String>,
}

impl SchemeSearchClient {
    pub fn new(config: &SchemeSearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("seva/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some()
    }

    /// Search for schemes matching `query`
    pub async fn search(&self, query: &str) -> Result<Value> {
        let Some(api_url) = &self.api_url else {
            bail!("Scheme search is not configured");
        };

        tracing::debug!(%query, "Searching schemes");

        let response = self
            .client
            .get(api_url)
            .query(&[("q", query)])
            .send()
            .await
            .with_context(|| format!("Failed to reach scheme search at {}", api_url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Scheme search failed with HTTP {}", status.as_u16());
        }

        let results: Value = response
            .json()
            .await
            .context("Failed to parse scheme search response")?;

        Ok(json!({
            "success": true,
            "query": query,
            "results": results,
        }))
    }
}
