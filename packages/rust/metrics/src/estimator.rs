//! Heuristic keyword metric estimation.
//!
//! Pure, deterministic functions of a lower-cased/trimmed keyword string.
//! Used whenever no real ads-data provider is configured; the two are never
//! mixed for the same keyword.

use keywordscout_shared::{KeywordMetrics, SearchIntent};

/// Question prefixes that mark informational queries.
const QUESTION_PREFIXES: [&str; 4] = ["how to", "what is", "why", "when"];

/// Base monthly volume before any modifier.
const VOLUME_BASE: i64 = 100;

/// Base ranking difficulty before any modifier.
const DIFFICULTY_BASE: i64 = 50;

/// Base cost-per-click in dollars before any modifier.
const CPC_BASE: f64 = 1.50;

/// Minimum volume estimate.
const VOLUME_FLOOR: i64 = 10;

/// Minimum CPC estimate.
const CPC_FLOOR: f64 = 0.10;

fn word_count(keyword: &str) -> usize {
    keyword.split_whitespace().count()
}

fn has_question_prefix(keyword: &str) -> bool {
    QUESTION_PREFIXES.iter().any(|p| keyword.starts_with(p))
}

fn contains_any(keyword: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| keyword.contains(t))
}

/// Estimate monthly search volume for a normalized keyword.
pub fn estimate_volume(keyword: &str) -> u32 {
    let wc = word_count(keyword) as i64;
    let mut volume = VOLUME_BASE;

    // Short phrases search more; the bonus decays 10 per word.
    if wc <= 5 {
        volume += 50 - wc * 10;
    }

    if contains_any(keyword, &["seo", "marketing"]) {
        volume += 200;
    }
    if contains_any(keyword, &["startup", "business"]) {
        volume += 150;
    }
    if contains_any(keyword, &["content", "article", "tool", "software", "generator"]) {
        volume += 100;
    }
    if keyword.contains("free") {
        volume += 80;
    }
    if contains_any(keyword, &["template", "checklist"]) {
        volume += 60;
    }
    if has_question_prefix(keyword) {
        volume += 50;
    }

    // Long-tail phrases taper off.
    if wc > 4 {
        volume -= (wc - 4) * 20;
    }

    volume.max(VOLUME_FLOOR) as u32
}

/// Estimate ranking difficulty (0–100) for a normalized keyword.
pub fn estimate_difficulty(keyword: &str) -> u8 {
    let wc = word_count(keyword) as i64;
    let mut difficulty = DIFFICULTY_BASE;

    if wc < 5 {
        difficulty += (5 - wc) * 10;
    }
    if keyword.contains("best") {
        difficulty += 20;
    }
    if wc <= 2 {
        difficulty += 15;
    }
    if wc >= 5 {
        difficulty -= 15;
    }
    if has_question_prefix(keyword) {
        difficulty -= 10;
    }
    if contains_any(keyword, &["tool", "software"]) {
        difficulty += 10;
    }
    if keyword.contains("free") {
        difficulty -= 5;
    }
    if contains_any(keyword, &["template", "checklist"]) {
        difficulty -= 10;
    }
    if wc >= 6 {
        difficulty -= 15;
    }

    difficulty.clamp(0, 100) as u8
}

/// Estimate cost-per-click in dollars for a normalized keyword.
pub fn estimate_cpc(keyword: &str) -> f64 {
    let mut cpc = CPC_BASE;

    if contains_any(keyword, &["startup", "business", "marketing"]) {
        cpc += 1.00;
    }
    if contains_any(keyword, &["tool", "software"]) {
        cpc += 0.50;
    }
    if keyword.contains("free") {
        cpc -= 0.75;
    }
    if keyword.contains("best") {
        cpc += 0.25;
    }
    if keyword.contains("seo") {
        cpc += 0.50;
    }

    (cpc.max(CPC_FLOOR) * 100.0).round() / 100.0
}

/// Classify searcher intent. First matching rule wins.
pub fn classify_intent(keyword: &str) -> SearchIntent {
    if contains_any(keyword, &["login", "signup"]) {
        SearchIntent::Navigational
    } else if contains_any(keyword, &["tool", "software", "best"]) {
        SearchIntent::Commercial
    } else if contains_any(keyword, &["free", "online", "template"]) {
        SearchIntent::Transactional
    } else if has_question_prefix(keyword) {
        SearchIntent::Informational
    } else if contains_any(keyword, &["guide", "tutorial", "framework"]) {
        SearchIntent::Educational
    } else {
        SearchIntent::Mixed
    }
}

/// Full heuristic metric bundle for a normalized keyword.
///
/// `opportunity` stays `None`; it is computed later once the semantic
/// similarity to the domain profile is known.
pub fn estimate_metrics(keyword: &str) -> KeywordMetrics {
    KeywordMetrics {
        volume: Some(estimate_volume(keyword)),
        difficulty: Some(estimate_difficulty(keyword)),
        cpc: Some(estimate_cpc(keyword)),
        intent: classify_intent(keyword),
        opportunity: None,
    }
}
