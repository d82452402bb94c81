//! Seed keyword generation.
//!
//! One chat request turns a domain context into a handful of seed phrases.
//! Model failure is soft: the stage falls back to deterministic seeds
//! derived from the niche and domain, and the run continues.

use tracing::warn;

use keywordscout_shared::{DomainContext, normalize_keyword};

use crate::chat::{ChatModel, strip_code_fences};

const SYSTEM_PROMPT: &str = "You are a keyword strategist. Respond ONLY with a JSON array of \
     lowercase keyword phrases, no markdown, no commentary.";

/// Generate seed keywords for a domain context.
///
/// Returns normalized, deduplicated seeds, at most `count`. Falls back to
/// [`fallback_seeds`] when the model call or parse fails.
pub async fn generate_seeds(
    model: &dyn ChatModel,
    context: &DomainContext,
    count: usize,
) -> Vec<String> {
    let user_prompt = format!(
        "Suggest {count} short seed keyword phrases (2-4 words each) that describe \
         content topics for this website.\n\nDomain: {}\nNiche: {}\n\n\
         JSON array only.",
        context.domain(),
        context.niche(),
    );

    let raw = match model.complete(SYSTEM_PROMPT, &user_prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "seed generation request failed, using fallback seeds");
            return fallback_seeds(context, count);
        }
    };

    match parse_seed_response(&raw, count) {
        Some(seeds) if !seeds.is_empty() => seeds,
        _ => {
            warn!("seed generation returned no usable seeds, using fallback seeds");
            fallback_seeds(context, count)
        }
    }
}

/// Parse a JSON array of seed phrases, normalizing and deduplicating.
fn parse_seed_response(raw: &str, count: usize) -> Option<Vec<String>> {
    let phrases: Vec<String> = serde_json::from_str(strip_code_fences(raw)).ok()?;

    let mut seeds = Vec::new();
    for phrase in phrases {
        if let Some(normalized) = normalize_keyword(&phrase) {
            if !seeds.contains(&normalized) {
                seeds.push(normalized);
            }
        }
        if seeds.len() == count {
            break;
        }
    }
    Some(seeds)
}

/// Deterministic seeds from the niche and domain, used when the model is
/// unavailable.
pub fn fallback_seeds(context: &DomainContext, count: usize) -> Vec<String> {
    let niche = context.niche().trim().to_lowercase();
    let domain_stem = context
        .domain()
        .split('.')
        .next()
        .unwrap_or_default()
        .replace('-', " ");

    let candidates = [
        niche.clone(),
        format!("{niche} tools"),
        format!("best {niche}"),
        format!("how to {niche}"),
        format!("{niche} guide"),
        domain_stem,
    ];

    let mut seeds = Vec::new();
    for candidate in candidates {
        if let Some(normalized) = normalize_keyword(&candidate) {
            if !seeds.contains(&normalized) {
                seeds.push(normalized);
            }
        }
        if seeds.len() == count {
            break;
        }
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keywordscout_shared::{KeywordScoutError, Result};

    struct CannedChat(String);

    #[async_trait]
    impl ChatModel for CannedChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatModel for FailingChat {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Err(KeywordScoutError::Network("connection refused".into()))
        }
    }

    fn context() -> DomainContext {
        DomainContext::Raw {
            domain: "acme.io".into(),
            niche: "keyword research".into(),
            competitors: vec![],
        }
    }

    #[tokio::test]
    async fn parses_model_seeds() {
        let chat = CannedChat(r#"["SEO Tools", "keyword research", "seo tools", "ab"]"#.into());
        let seeds = generate_seeds(&chat, &context(), 5).await;
        // Normalized, deduplicated, too-short entries dropped.
        assert_eq!(seeds, vec!["seo tools", "keyword research"]);
    }

    #[tokio::test]
    async fn respects_requested_count() {
        let chat = CannedChat(r#"["one keyword", "two keyword", "three keyword"]"#.into());
        let seeds = generate_seeds(&chat, &context(), 2).await;
        assert_eq!(seeds.len(), 2);
    }

    #[tokio::test]
    async fn fenced_response_still_parses() {
        let chat = CannedChat("```json\n[\"content ideas\"]\n```".into());
        let seeds = generate_seeds(&chat, &context(), 5).await;
        assert_eq!(seeds, vec!["content ideas"]);
    }

    #[tokio::test]
    async fn model_failure_falls_back() {
        let seeds = generate_seeds(&FailingChat, &context(), 5).await;
        assert!(!seeds.is_empty());
        assert!(seeds.contains(&"keyword research".to_string()));
        assert_eq!(seeds, fallback_seeds(&context(), 5));
    }

    #[tokio::test]
    async fn garbage_response_falls_back() {
        let chat = CannedChat("I'd be happy to help with keywords!".into());
        let seeds = generate_seeds(&chat, &context(), 5).await;
        assert_eq!(seeds, fallback_seeds(&context(), 5));
    }

    #[test]
    fn fallback_seeds_are_deterministic() {
        let a = fallback_seeds(&context(), 5);
        let b = fallback_seeds(&context(), 5);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert_eq!(a[0], "keyword research");
    }
}
