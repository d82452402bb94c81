//! Candidate keyword sources for KeywordScout.
//!
//! Collaborator contracts for the aggregation stage: autocomplete
//! suggestions, SERP-adjacent phrases, and competitor mining. Every
//! implementation treats transport failures as soft — it logs and returns an
//! empty list — so an `Err` escaping one of these traits is by construction
//! unexpected and fails the whole run.

pub mod autocomplete;
pub mod competitors;
pub mod serp;

use async_trait::async_trait;

use keywordscout_shared::{KeywordScoutError, Result};

pub use autocomplete::GoogleAutocomplete;
pub use competitors::SitemapCompetitorMiner;
pub use serp::DuckDuckGoSerp;

/// User-Agent string for outbound requests.
pub(crate) const USER_AGENT: &str = concat!("KeywordScout/", env!("CARGO_PKG_VERSION"));

/// HTTP timeout for source fetches.
pub(crate) const FETCH_TIMEOUT_SECS: u64 = 15;

/// Autocomplete suggestion source for a seed phrase.
#[async_trait]
pub trait AutocompleteSource: Send + Sync {
    /// Suggestion phrases for a seed; empty on soft failure.
    async fn suggestions(&self, seed: &str) -> Result<Vec<String>>;
}

/// SERP-adjacent phrase source for a seed phrase.
#[async_trait]
pub trait SerpSource: Send + Sync {
    /// Related phrases pulled from search results; empty on soft failure.
    async fn related_phrases(&self, seed: &str) -> Result<Vec<String>>;
}

/// Competitor domain miner.
#[async_trait]
pub trait CompetitorMiner: Send + Sync {
    /// Candidate phrases mined from a competitor domain; empty on soft failure.
    async fn mine(&self, domain: &str) -> Result<Vec<String>>;
}

/// Build the shared HTTP client for source fetches.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(3))
        .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| KeywordScoutError::Network(format!("failed to build HTTP client: {e}")))
}
