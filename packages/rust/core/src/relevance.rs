//! AI relevance filtering of candidate keywords.
//!
//! Classifies candidates into confidence tiers against a domain profile,
//! one chat request per chunk. The filter is fail-open: a candidate the
//! model didn't cover, or a whole failed chunk, defaults to *medium* — it
//! never silently drops a keyword. Defaults are explicit sentinels so tests
//! and callers can tell "classified medium" from "failed and defaulted".

use std::collections::HashMap;

use tracing::warn;

use keywordscout_shared::DomainContext;

use crate::chat::{ChatModel, strip_code_fences};

const SYSTEM_PROMPT: &str = "You classify keyword relevance for a website. Respond ONLY with a JSON \
     object mapping each keyword's index to \"high\", \"medium\", or \"low\", \
     no markdown, no commentary.";

/// Relevance confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Why a candidate received the default tier instead of a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// The chunk response parsed but did not mention this candidate.
    MissingFromResponse,
    /// The whole chunk request failed or was unparseable.
    RequestFailed,
}

/// Outcome of classifying one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The model assigned this tier.
    Classified(Confidence),
    /// Fail-open default (always medium), with the reason it applied.
    Defaulted { reason: DefaultReason },
}

impl Classification {
    /// The effective confidence tier.
    pub fn confidence(&self) -> Confidence {
        match self {
            Self::Classified(c) => *c,
            Self::Defaulted { .. } => Confidence::Medium,
        }
    }

    /// Whether this is a fail-open default rather than a real classification.
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }
}

/// Classify every candidate against the domain profile.
///
/// Splits the input into `chunk_size` batches, one request each. The result
/// maps every input keyword — nothing is dropped.
pub async fn classify_relevance(
    model: &dyn ChatModel,
    context: &DomainContext,
    candidates: &[String],
    chunk_size: usize,
) -> HashMap<String, Classification> {
    let chunk_size = chunk_size.max(1);
    let mut result = HashMap::with_capacity(candidates.len());

    for chunk in candidates.chunks(chunk_size) {
        let user_prompt = build_chunk_prompt(context, chunk);

        let tiers = match model.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(raw) => parse_tier_map(&raw),
            Err(e) => {
                warn!(
                    chunk_len = chunk.len(),
                    error = %e,
                    "relevance chunk request failed, defaulting chunk to medium"
                );
                None
            }
        };

        match tiers {
            Some(map) => {
                for (i, keyword) in chunk.iter().enumerate() {
                    let classification = match map.get(&i) {
                        Some(tier) => Classification::Classified(*tier),
                        None => Classification::Defaulted {
                            reason: DefaultReason::MissingFromResponse,
                        },
                    };
                    result.insert(keyword.clone(), classification);
                }
            }
            None => {
                for keyword in chunk {
                    result.insert(
                        keyword.clone(),
                        Classification::Defaulted {
                            reason: DefaultReason::RequestFailed,
                        },
                    );
                }
            }
        }
    }

    result
}

/// Build the user prompt for one chunk.
fn build_chunk_prompt(context: &DomainContext, chunk: &[String]) -> String {
    let mut prompt = format!(
        "Website profile:\n{}\n\nRate how relevant each keyword is to this website \
         (high / medium / low):\n",
        context.profile_text()
    );
    for (i, keyword) in chunk.iter().enumerate() {
        prompt.push_str(&format!("{i}. {keyword}\n"));
    }
    prompt.push_str("\nJSON object only, keys are the indices above.");
    prompt
}

/// Parse an index → tier JSON object. `None` means the response is unusable
/// and the whole chunk should default.
fn parse_tier_map(raw: &str) -> Option<HashMap<usize, Confidence>> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(raw)).ok()?;
    let object = value.as_object()?;

    let mut map = HashMap::new();
    for (key, tier) in object {
        let Ok(index) = key.trim().parse::<usize>() else {
            continue;
        };
        if let Some(confidence) = tier.as_str().and_then(Confidence::parse) {
            map.insert(index, confidence);
        }
    }
    Some(map)
}
