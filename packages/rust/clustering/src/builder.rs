//! Iterative greedy cluster merging over keyword embeddings.
//!
//! Clusters are compared by their *first member's* embedding only — not full
//! inter-cluster linkage. That trades some recall for a bounded
//! O(passes × n²) worst case; transitively similar keywords converge into
//! one group within a few passes.

use tracing::{debug, info};

use keywordscout_embeddings::cosine_similarity;

use crate::disjoint_set::DisjointSet;

/// Tunables for the merge loop. Defaults match the production pipeline.
#[derive(Debug, Clone)]
pub struct ClusterParams {
    /// Minimum first-member cosine similarity for a merge.
    pub similarity_threshold: f32,
    /// Maximum members per cluster.
    pub max_cluster_size: usize,
    /// Upper bound on merge passes.
    pub max_passes: usize,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            max_cluster_size: 10,
            max_passes: 100,
        }
    }
}

/// One keyword entering the cluster builder.
#[derive(Debug, Clone)]
pub struct ClusterItem {
    /// Normalized keyword text.
    pub text: String,
    /// Estimated volume, if known.
    pub volume: Option<u32>,
    /// Opportunity score, if known.
    pub opportunity: Option<u8>,
    /// Embedding vector (zero-length or zero-magnitude never merges).
    pub embedding: Vec<f32>,
}

/// A multi-member cluster, indices into the input slice.
#[derive(Debug, Clone)]
pub struct ClusterGroup {
    /// Sequential cluster id, 1-based in first-member order.
    pub id: i64,
    /// Member indices in merge order; `members[0]` is the comparison anchor.
    pub members: Vec<usize>,
    /// Index of the elected representative; always one of `members`.
    pub representative: usize,
}

/// Result of a clustering run.
#[derive(Debug)]
pub struct ClusterOutcome {
    /// Clusters with at least two members.
    pub groups: Vec<ClusterGroup>,
    /// Indices that remained singletons (pass through ungrouped).
    pub singletons: Vec<usize>,
    /// Merge passes executed before convergence or the cap.
    pub passes: usize,
}

/// Group near-duplicate keywords by iterative greedy pairwise merging.
pub fn build_clusters(items: &[ClusterItem], params: &ClusterParams) -> ClusterOutcome {
    if items.is_empty() {
        return ClusterOutcome {
            groups: Vec::new(),
            singletons: Vec::new(),
            passes: 0,
        };
    }

    let mut sets = DisjointSet::new(items.len());
    let mut passes = 0;

    for _ in 0..params.max_passes {
        passes += 1;
        let mut merged_this_pass = false;
        let snapshot = sets.roots();

        for (pos, &anchor) in snapshot.iter().enumerate() {
            // Absorbed earlier in this same pass.
            if sets.find(anchor) != anchor {
                continue;
            }

            for &other in &snapshot[pos + 1..] {
                if sets.members(anchor).len() >= params.max_cluster_size {
                    break;
                }
                if sets.find(other) != other {
                    continue;
                }

                let sim =
                    cosine_similarity(&items[anchor].embedding, &items[other].embedding);
                if sim >= params.similarity_threshold {
                    sets.union_into(anchor, other);
                    merged_this_pass = true;
                }
            }
        }

        if !merged_this_pass {
            break;
        }
    }

    debug!(passes, "cluster merge loop finished");

    let mut groups = Vec::new();
    let mut singletons = Vec::new();
    let mut next_id: i64 = 1;

    for root in sets.roots() {
        let members = sets.members(root).to_vec();
        if members.len() < 2 {
            singletons.push(root);
            continue;
        }

        let representative = elect_representative(items, &members);
        groups.push(ClusterGroup {
            id: next_id,
            members,
            representative,
        });
        next_id += 1;
    }

    info!(
        passes,
        clusters = groups.len(),
        singletons = singletons.len(),
        "clustering complete"
    );

    ClusterOutcome {
        groups,
        singletons,
        passes,
    }
}

/// Pick the member maximizing `volume × opportunity − 0.01 × text_length`.
///
/// The length penalty doubles as the tie-break: equal products resolve to
/// the shorter text. Exactly equal scores keep the earliest member.
fn elect_representative(items: &[ClusterItem], members: &[usize]) -> usize {
    let mut best = members[0];
    let mut best_score = representative_score(&items[best]);

    for &idx in &members[1..] {
        let score = representative_score(&items[idx]);
        if score > best_score {
            best = idx;
            best_score = score;
        }
    }
    best
}

fn representative_score(item: &ClusterItem) -> f64 {
    let volume = f64::from(item.volume.unwrap_or(0));
    let opportunity = f64::from(item.opportunity.unwrap_or(0));
    volume * opportunity - 0.01 * item.text.chars().count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn item(text: &str, volume: u32, opportunity: u8, embedding: Vec<f32>) -> ClusterItem {
        ClusterItem {
            text: text.into(),
            volume: Some(volume),
            opportunity: Some(opportunity),
            embedding,
        }
    }

    /// Partition as a set of sets of texts, for order-insensitive equality.
    fn partition(items: &[ClusterItem], outcome: &ClusterOutcome) -> BTreeSet<BTreeSet<String>> {
        let mut sets = BTreeSet::new();
        for g in &outcome.groups {
            sets.insert(
                g.members
                    .iter()
                    .map(|&i| items[i].text.clone())
                    .collect::<BTreeSet<_>>(),
            );
        }
        for &s in &outcome.singletons {
            sets.insert(std::iter::once(items[s].text.clone()).collect());
        }
        sets
    }

    fn seo_fixture() -> Vec<ClusterItem> {
        // Three near-duplicates plus one unrelated keyword; the first three
        // are pairwise ≥ 0.99 similar, all < 0.15 to the last.
        vec![
            item("seo tools", 1000, 70, vec![1.0, 0.0]),
            item("tools for seo", 500, 60, vec![0.9, 0.1]),
            item("seo tool", 300, 60, vec![0.95, 0.05]),
            item("content marketing", 800, 65, vec![0.0, 1.0]),
        ]
    }

    #[test]
    fn near_duplicates_form_one_cluster() {
        let items = seo_fixture();
        let outcome = build_clusters(&items, &ClusterParams::default());

        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.singletons.len(), 1);

        let group = &outcome.groups[0];
        assert_eq!(group.members, vec![0, 1, 2]);
        // Highest volume × opportunity wins.
        assert_eq!(group.representative, 0);
        assert_eq!(items[outcome.singletons[0]].text, "content marketing");
    }

    #[test]
    fn clustering_is_stable_under_input_permutation() {
        let items = seo_fixture();
        let baseline = partition(&items, &build_clusters(&items, &ClusterParams::default()));

        for perm in [[3usize, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]] {
            let shuffled: Vec<ClusterItem> = perm.iter().map(|&i| items[i].clone()).collect();
            let outcome = build_clusters(&shuffled, &ClusterParams::default());
            assert_eq!(partition(&shuffled, &outcome), baseline);
        }
    }

    #[test]
    fn reclustering_is_idempotent() {
        let items = seo_fixture();
        let first = build_clusters(&items, &ClusterParams::default());
        let second = build_clusters(&items, &ClusterParams::default());
        assert_eq!(partition(&items, &first), partition(&items, &second));
    }

    #[test]
    fn cluster_size_is_capped() {
        // 15 identical embeddings with a cap of 10: one full cluster, the
        // remainder forms a second.
        let items: Vec<ClusterItem> = (0..15)
            .map(|i| item(&format!("keyword variant {i}"), 100, 50, vec![1.0, 0.0]))
            .collect();
        let outcome = build_clusters(&items, &ClusterParams::default());

        let mut seen = BTreeSet::new();
        for g in &outcome.groups {
            assert!(g.members.len() <= 10, "cluster exceeded cap");
            for &m in &g.members {
                assert!(seen.insert(m), "keyword in two clusters");
            }
        }
        for &s in &outcome.singletons {
            assert!(seen.insert(s), "singleton also in a cluster");
        }
        assert_eq!(seen.len(), 15);
        assert_eq!(outcome.groups[0].members.len(), 10);
        assert_eq!(outcome.groups[1].members.len(), 5);
    }

    #[test]
    fn zero_vectors_never_merge() {
        // A fully degraded embedding run: every similarity resolves to 0.0,
        // so every keyword stays a singleton.
        let items: Vec<ClusterItem> = (0..5)
            .map(|i| item(&format!("keyword {i}"), 100, 50, vec![0.0, 0.0, 0.0]))
            .collect();
        let outcome = build_clusters(&items, &ClusterParams::default());

        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.singletons.len(), 5);
        assert_eq!(outcome.passes, 1);
    }

    #[test]
    fn representative_tie_breaks_to_shorter_text() {
        // Identical volume × opportunity; the longer text is listed first so
        // only the length penalty can flip the choice.
        let items = vec![
            item("seo tools", 100, 50, vec![1.0, 0.0]),
            item("seo tool", 100, 50, vec![1.0, 0.0]),
        ];
        let outcome = build_clusters(&items, &ClusterParams::default());
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].representative, 1);
    }

    #[test]
    fn representative_election_is_deterministic() {
        let items = seo_fixture();
        let a = build_clusters(&items, &ClusterParams::default());
        let b = build_clusters(&items, &ClusterParams::default());
        assert_eq!(
            a.groups[0].representative,
            b.groups[0].representative
        );
    }

    #[test]
    fn converges_in_two_passes_when_second_pass_is_clean() {
        // Anchor 0 matches nothing; 1 and 2 merge in pass one; pass two
        // finds nothing and stops well before the cap.
        let items = vec![
            item("unrelated keyword", 100, 50, vec![0.0, 1.0]),
            item("seo tools", 100, 50, vec![1.0, 0.0]),
            item("seo tool", 100, 50, vec![0.95, 0.05]),
        ];
        let outcome = build_clusters(&items, &ClusterParams::default());
        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.groups.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_outcome() {
        let outcome = build_clusters(&[], &ClusterParams::default());
        assert!(outcome.groups.is_empty());
        assert!(outcome.singletons.is_empty());
        assert_eq!(outcome.passes, 0);
    }
}
