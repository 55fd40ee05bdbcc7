//! Web search through the Tavily API.

use super::WebSearch;
use crate::error::{AdapterError, AdapterResult};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_ENDPOINT: &str = "https://api.tavily.com/search";

/// Tavily search client.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    search_depth: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
}

impl TavilySearch {
    pub fn new(api_key: Option<String>, search_depth: &str, timeout: Duration) -> AdapterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            search_depth: search_depth.to_string(),
        })
    }

    /// Point the client at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> AdapterResult<serde_json::Value> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AdapterError::InvalidArguments("Empty search query".to_string()));
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AdapterError::Unavailable(
                "TAVILY_API_KEY not set. Set it with: export TAVILY_API_KEY='tvly-...'".to_string(),
            )
        })?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&SearchRequest {
                query,
                search_depth: &self.search_depth,
                max_results: 5,
            })
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = response.json().await?;
        if body.get("results").is_none() {
            return Err(AdapterError::Malformed(
                "Search response has no 'results' field".to_string(),
            ));
        }

        debug!(
            "Web search returned {} results",
            body["results"].as_array().map(|r| r.len()).unwrap_or(0)
        );
        Ok(body)
    }
}
