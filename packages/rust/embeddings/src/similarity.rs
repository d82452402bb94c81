//! Cosine similarity over embedding vectors.
//!
//! Similarity is clamped to `[0, 1]` for this domain. Any degenerate input
//! (empty, mismatched dimensions, zero magnitude) scores exactly 0.0, which
//! is what makes zero-vector degradation safe: a failed embedding can never
//! look like a match.

use tracing::debug;

use crate::provider::EmbeddingProvider;

/// Cosine similarity of two vectors, clamped to `[0, 1]`.
///
/// Returns exactly `0.0` when either vector is empty, the dimensions differ,
/// or either magnitude is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    sim.clamp(0.0, 1.0) as f32
}

/// A candidate paired with its similarity to a base text.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    /// The candidate text.
    pub item: String,
    /// Cosine similarity to the base text, in `[0, 1]`.
    pub similarity: f32,
}

/// Similarity of one base text against many candidates.
///
/// The base is embedded once and each candidate once (batched per the
/// provider's limit); results are paired by index. Degraded embeddings on
/// either side resolve to 0.0.
pub async fn batch_similarity(
    provider: &dyn EmbeddingProvider,
    base_text: &str,
    candidates: &[String],
) -> Vec<ScoredItem> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let base = provider.embed_batch(&[base_text.to_string()]).await;
    let candidate_embeddings = provider.embed_batch(candidates).await;

    let base_values: &[f32] = base.first().map(|e| e.values.as_slice()).unwrap_or(&[]);

    let degraded = candidate_embeddings.iter().filter(|e| e.degraded).count();
    if degraded > 0 {
        debug!(degraded, total = candidates.len(), "degraded candidate embeddings");
    }

    candidates
        .iter()
        .zip(candidate_embeddings.iter())
        .map(|(text, embedding)| ScoredItem {
            item: text.clone(),
            similarity: cosine_similarity(base_values, &embedding.values),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Embedding;
    use async_trait::async_trait;

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn opposite_vectors_clamp_to_zero() {
        // Negative cosine is clamped for this domain.
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }

    #[test]
    fn degenerate_inputs_score_exactly_zero() {
        assert_eq!(cosine_similarity(&[], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn similarity_stays_in_unit_range() {
        let pairs = [
            (vec![0.1f32, 0.9, 0.3], vec![0.2f32, 0.8, 0.4]),
            (vec![5.0, 0.0, 0.0], vec![5.0, 0.1, 0.0]),
            (vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]),
        ];
        for (a, b) in &pairs {
            let sim = cosine_similarity(a, b);
            assert!((0.0..=1.0).contains(&sim), "similarity {sim} out of range");
        }
    }

    /// Deterministic provider for batch tests: maps known words to axis
    /// vectors, everything else to a degraded zero-vector.
    struct AxisProvider;

    #[async_trait]
    impl EmbeddingProvider for AxisProvider {
        fn dimension(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> Vec<Embedding> {
            texts
                .iter()
                .map(|t| match t.as_str() {
                    "x" => Embedding::new(vec![1.0, 0.0, 0.0]),
                    "y" => Embedding::new(vec![0.0, 1.0, 0.0]),
                    "xy" => Embedding::new(vec![1.0, 1.0, 0.0]),
                    _ => Embedding::zero(3),
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn batch_similarity_pairs_by_index() {
        let candidates = vec!["x".to_string(), "xy".to_string(), "unknown".to_string()];
        let scored = batch_similarity(&AxisProvider, "x", &candidates).await;

        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].item, "x");
        assert!((scored[0].similarity - 1.0).abs() < 1e-6);
        assert!((scored[1].similarity - (1.0 / 2.0f32.sqrt())).abs() < 1e-5);
        assert_eq!(scored[2].similarity, 0.0);
    }

    #[tokio::test]
    async fn degraded_base_yields_all_zero() {
        let candidates = vec!["x".to_string(), "y".to_string()];
        let scored = batch_similarity(&AxisProvider, "unknown base", &candidates).await;
        assert!(scored.iter().all(|s| s.similarity == 0.0));
    }
}
