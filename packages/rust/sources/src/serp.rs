//! SERP-adjacent phrase source backed by the DuckDuckGo HTML endpoint.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use keywordscout_shared::{KeywordScoutError, Result};

use crate::{SerpSource, http_client};

/// Default HTML search endpoint origin.
const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

/// Result titles to harvest per query.
const MAX_RESULTS: usize = 20;

/// Related phrases scraped from DuckDuckGo's HTML results page.
pub struct DuckDuckGoSerp {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoSerp {
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
        let url = format!("{}/html/", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", seed)])
            .send()
            .await
            .map_err(|e| KeywordScoutError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeywordScoutError::Network(format!(
                "SERP endpoint returned HTTP {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| KeywordScoutError::Network(e.to_string()))?;

        Ok(extract_result_titles(&html))
    }
}

#[async_trait]
impl SerpSource for DuckDuckGoSerp {
    async fn related_phrases(&self, seed: &str) -> Result<Vec<String>> {
        match self.fetch(seed).await {
            Ok(phrases) => {
                debug!(seed, count = phrases.len(), "SERP phrases fetched");
                Ok(phrases)
            }
            Err(e) => {
                warn!(seed, error = %e, "SERP fetch failed, continuing without");
                Ok(Vec::new())
            }
        }
    }
}

/// Pull result link titles out of the HTML results page.
fn extract_result_titles(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("a.result__a").expect("static selector");

    doc.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_RESULTS)
        .collect()
}
