//! Chat-model client used for seed generation and relevance classification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use keywordscout_shared::{KeywordScoutError, OpenRouterConfig, Result};

/// HTTP timeout for chat requests. Classification batches are large, so this
/// is generous.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Completion token budget per request.
const MAX_TOKENS: u32 = 4096;

/// A chat completion endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One system + user exchange; returns the assistant's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// OpenRouter implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenRouter chat-completions client.
pub struct OpenRouterChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterChat {
    /// Build a client from config, reading the API key from the configured
    /// env var.
    pub fn new(config: &OpenRouterConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            KeywordScoutError::config(format!(
                "chat API key not found. Set the {} environment variable.",
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
            model: config.chat_model.clone(),
            base_url: "https://openrouter.ai/api".into(),
        })
    }

    /// Override the API base URL (for tests against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenRouterChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| KeywordScoutError::Network(format!("chat request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KeywordScoutError::Model(format!(
                "chat API error {status}: {}",
                &body[..body.len().min(200)]
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| KeywordScoutError::parse(format!("chat response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| KeywordScoutError::Model("chat response had no choices".into()))
    }
}

/// Strip a surrounding markdown code fence, if present.
///
/// Models often wrap JSON in ```json ... ``` despite instructions not to.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn strips_plain_fences() {
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    fn test_chat(server_uri: &str) -> OpenRouterChat {
        // SAFETY: test-only env var, unique to this crate's tests.
        unsafe { std::env::set_var("KS_CHAT_TEST_KEY", "test-key") };
        let config = OpenRouterConfig {
            api_key_env: "KS_CHAT_TEST_KEY".into(),
            chat_model: "test/model".into(),
        };
        OpenRouterChat::new(&config)
            .expect("build chat client")
            .with_base_url(server_uri)
    }

    #[tokio::test]
    async fn completes_a_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "[\"seo tools\"]" } }
                ]
            })))
            .mount(&server)
            .await;

        let chat = test_chat(&server.uri());
        let text = chat.complete("system", "user").await.expect("complete");
        assert_eq!(text, "[\"seo tools\"]");
    }

    #[tokio::test]
    async fn api_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let chat = test_chat(&server.uri());
        let err = chat.complete("system", "user").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
