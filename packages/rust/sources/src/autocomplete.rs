//! Google suggest autocomplete source.
//!
//! Uses the public firefox-client suggest endpoint, which returns
//! `["query", ["suggestion", ...]]` as JSON.

use async_trait::async_trait;
use tracing::{debug, warn};

use keywordscout_shared::Result;

use crate::{AutocompleteSource, http_client};

/// Default suggest endpoint origin.
const DEFAULT_BASE_URL: &str = "https://suggestqueries.google.com";

/// Autocomplete suggestions from the Google suggest endpoint.
pub struct GoogleAutocomplete {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleAutocomplete {
    /// Build the source with the production endpoint.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    /// Override the endpoint origin (for tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, seed: &str) -> Result<Vec<String>> {
        let url = format!("{}/complete/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("client", "firefox"), ("q", seed)])
            .send()
            .await
            .map_err(|e| keywordscout_shared::KeywordScoutError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(keywordscout_shared::KeywordScoutError::Network(format!(
                "suggest endpoint returned HTTP {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| keywordscout_shared::KeywordScoutError::parse(e.to_string()))?;

        Ok(parse_suggest_response(&body))
    }
}

#[async_trait]
impl AutocompleteSource for GoogleAutocomplete {
    async fn suggestions(&self, seed: &str) -> Result<Vec<String>> {
        match self.fetch(seed).await {
            Ok(suggestions) => {
                debug!(seed, count = suggestions.len(), "autocomplete fetched");
                Ok(suggestions)
            }
            Err(e) => {
                warn!(seed, error = %e, "autocomplete fetch failed, continuing without");
                Ok(Vec::new())
            }
        }
    }
}

/// Extract the suggestion array from a `["query", [...]]` response.
fn parse_suggest_response(body: &serde_json::Value) -> Vec<String> {
    body.get(1)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
