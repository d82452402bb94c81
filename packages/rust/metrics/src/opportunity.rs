//! Composite opportunity scoring.
//!
//! Combines volume, difficulty, semantic relevance, and intent into a single
//! 0–100 score used to rank candidates.

use keywordscout_shared::SearchIntent;

/// Volume is capped here before scaling into the score.
const VOLUME_CAP: f64 = 2000.0;

/// Weight of the volume component.
const VOLUME_WEIGHT: f64 = 0.4;

/// Weight of the (inverted) difficulty component.
const DIFFICULTY_WEIGHT: f64 = 0.3;

/// Weight of the semantic relevance component.
const RELEVANCE_WEIGHT: f64 = 30.0;

/// Volume above which low-relevance keywords are penalized.
const MEGA_VOLUME: u32 = 10_000;

/// Relevance below which the mega-volume penalty applies.
const LOW_RELEVANCE: f32 = 0.4;

/// Volume below which the thin-volume penalty applies.
const THIN_VOLUME: u32 = 50;

/// Compute the 0–100 opportunity score.
///
/// Returns `None` unless both volume and difficulty are known. A missing
/// similarity contributes 0 to the relevance term and counts as low
/// relevance for the mega-volume penalty.
pub fn opportunity_score(
    volume: Option<u32>,
    difficulty: Option<u8>,
    similarity: Option<f32>,
    intent: SearchIntent,
) -> Option<u8> {
    let volume = volume?;
    let difficulty = difficulty?;
    let sim = similarity.unwrap_or(0.0);

    let volume_score = f64::from(volume).min(VOLUME_CAP) / VOLUME_CAP * 100.0 * VOLUME_WEIGHT;
    let difficulty_score = f64::from(100 - u32::from(difficulty.min(100))) * DIFFICULTY_WEIGHT;
    let relevance_score = f64::from(sim) * RELEVANCE_WEIGHT;

    let mut score = volume_score + difficulty_score + relevance_score;

    // Huge head terms that barely relate to the domain are a trap.
    if volume > MEGA_VOLUME && sim < LOW_RELEVANCE {
        score -= 20.0;
    }
    if volume < THIN_VOLUME {
        score -= 20.0;
    }

    match intent {
        SearchIntent::Commercial => score += 10.0,
        SearchIntent::Informational | SearchIntent::Educational => score += 5.0,
        _ => {}
    }

    Some(score.clamp(0.0, 100.0).round() as u8)
}
