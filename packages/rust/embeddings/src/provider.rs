//! Embedding provider contract and the OpenAI implementation.
//!
//! Providers never fail the caller: a transport/auth/quota failure degrades
//! to zero-vectors, flagged so downstream code can tell an outage apart from
//! "nothing similar here".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use keywordscout_shared::{KeywordScoutError, OpenAiConfig, Result};

/// Inputs longer than this are truncated before embedding.
pub const MAX_EMBED_CHARS: usize = 8000;

/// Default maximum texts per embedding request.
pub const DEFAULT_BATCH_LIMIT: usize = 2000;

/// HTTP timeout for embedding requests.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Embedding
// ---------------------------------------------------------------------------

/// A single embedding vector, carrying an explicit degradation flag.
///
/// A `degraded` embedding is a zero-vector substituted after a provider
/// failure. Cosine similarity against it is always 0.0, so degraded vectors
/// can never produce a false-positive match — but callers can still count
/// them and surface the outage instead of reporting "no similar keywords".
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Vector components.
    pub values: Vec<f32>,
    /// True when this is a zero-vector stand-in for a failed request.
    pub degraded: bool,
}

impl Embedding {
    /// A real embedding returned by the provider.
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            degraded: false,
        }
    }

    /// A zero-vector of the given dimensionality, flagged as degraded.
    pub fn zero(dim: usize) -> Self {
        Self {
            values: vec![0.0; dim],
            degraded: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Batch embedding provider.
///
/// `embed_batch` returns exactly one embedding per input, order preserved.
/// Implementations must not fail: per-request failures degrade to
/// [`Embedding::zero`] for the affected inputs.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector dimensionality produced by this provider.
    fn dimension(&self) -> usize;

    /// Maximum texts per underlying request; larger batches are split.
    fn batch_limit(&self) -> usize {
        DEFAULT_BATCH_LIMIT
    }

    /// Embed a batch of texts, one vector per input, order preserved.
    async fn embed_batch(&self, texts: &[String]) -> Vec<Embedding>;
}

// ---------------------------------------------------------------------------
// OpenAI implementation
// ---------------------------------------------------------------------------

/// Embedding request body for the OpenAI API.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Embedding response from the OpenAI API.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI `/v1/embeddings` client.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimension: usize,
    batch_limit: usize,
    base_url: String,
}

impl OpenAiEmbeddings {
    /// Build a client from config, reading the API key from the configured
    /// env var.
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            KeywordScoutError::config(format!(
                "embedding API key not found. Set the {} environment variable.",
                config.api_key_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| KeywordScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.embedding_model.clone(),
            dimension: config.embedding_dim,
            batch_limit: DEFAULT_BATCH_LIMIT,
            base_url: "https://api.openai.com".into(),
        })
    }

    /// Override the API base URL (for tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request batch limit.
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    /// Issue one embedding request for up to `batch_limit` texts.
    async fn request_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| KeywordScoutError::Network(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KeywordScoutError::Model(format!(
                "embedding API error {status}: {}",
                &body[..body.len().min(200)]
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| KeywordScoutError::parse(format!("embedding response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(KeywordScoutError::Model(format!(
                "embedding API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // Pair by the response's index field rather than trusting order.
        let mut vectors = vec![Vec::new(); texts.len()];
        for item in parsed.data {
            if item.index >= vectors.len() {
                return Err(KeywordScoutError::Model(format!(
                    "embedding API returned out-of-range index {}",
                    item.index
                )));
            }
            vectors[item.index] = item.embedding;
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    async fn embed_batch(&self, texts: &[String]) -> Vec<Embedding> {
        let mut out: Vec<Embedding> = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_limit) {
            let truncated: Vec<&str> =
                chunk.iter().map(|t| truncate_chars(t, MAX_EMBED_CHARS)).collect();

            match self.request_batch(&truncated).await {
                Ok(vectors) => {
                    debug!(count = vectors.len(), "embedded batch");
                    out.extend(vectors.into_iter().map(Embedding::new));
                }
                Err(e) => {
                    warn!(
                        count = chunk.len(),
                        error = %e,
                        "embedding batch failed, substituting zero-vectors"
                    );
                    out.extend(std::iter::repeat_with(|| Embedding::zero(self.dimension))
                        .take(chunk.len()));
                }
            }
        }

        out
    }
}

/// Truncate a string to at most `max_chars` bytes at a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> OpenAiConfig {
        OpenAiConfig {
            api_key_env: "KS_EMBED_TEST_KEY".into(),
            embedding_model: "text-embedding-3-small".into(),
            embedding_dim: 4,
        }
    }

    fn provider_for(server_uri: &str) -> OpenAiEmbeddings {
        // SAFETY: test-only env var, unique to this crate's tests.
        unsafe { std::env::set_var("KS_EMBED_TEST_KEY", "test-key") };
        OpenAiEmbeddings::new(&test_config())
            .expect("build provider")
            .with_base_url(server_uri)
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("short", 100), "short");
        let s = "é".repeat(10); // 2 bytes per char
        let t = truncate_chars(&s, 5);
        assert_eq!(t, "éé");
    }

    #[test]
    fn zero_embedding_is_degraded() {
        let e = Embedding::zero(8);
        assert!(e.degraded);
        assert_eq!(e.values.len(), 8);
        assert!(e.values.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn embed_batch_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    // Out of order on purpose: index must win.
                    { "index": 1, "embedding": [0.0, 1.0, 0.0, 0.0] },
                    { "index": 0, "embedding": [1.0, 0.0, 0.0, 0.0] }
                ]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server.uri());
        let texts = vec!["first".to_string(), "second".to_string()];
        let embeddings = provider.embed_batch(&texts).await;

        assert_eq!(embeddings.len(), 2);
        assert!(!embeddings[0].degraded);
        assert_eq!(embeddings[0].values, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(embeddings[1].values, vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn failed_batch_degrades_to_zero_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = provider_for(&server.uri());
        let texts = vec!["a keyword".to_string(), "another keyword".to_string()];
        let embeddings = provider.embed_batch(&texts).await;

        assert_eq!(embeddings.len(), 2);
        for e in &embeddings {
            assert!(e.degraded);
            assert_eq!(e.values, vec![0.0; 4]);
        }
    }

    #[tokio::test]
    async fn oversized_batch_is_split() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "index": 0, "embedding": [0.5, 0.5, 0.0, 0.0] },
                    { "index": 1, "embedding": [0.0, 0.5, 0.5, 0.0] }
                ]
            })))
            .expect(2) // 4 texts with limit 2 → two requests
            .mount(&server)
            .await;

        let provider = provider_for(&server.uri()).with_batch_limit(2);
        let texts: Vec<String> = (0..4).map(|i| format!("keyword {i}")).collect();
        let embeddings = provider.embed_batch(&texts).await;

        assert_eq!(embeddings.len(), 4);
        assert!(embeddings.iter().all(|e| !e.degraded));
    }
}
