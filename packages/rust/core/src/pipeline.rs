//! End-to-end research run orchestration.
//!
//! Sequences seed generation → expansion → relevance filtering → competitor
//! mining → metric scoring → persistence → clustering enrichment, recording
//! progress and the final status on the durable run record.
//!
//! Failure model: single-source fetch failures are absorbed inside the
//! collaborators (they log and return empty); an `Err` reaching this module
//! is unexpected and fails the run. A failed run always carries its error
//! message — it is never left in `processing`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use keywordscout_clustering::{ClusterItem, ClusterParams, build_clusters};
use keywordscout_embeddings::{Embedding, EmbeddingProvider, cosine_similarity};
use keywordscout_metrics::{
    AdsMetricsProvider, classify_intent, estimate_metrics, opportunity_score,
};
use keywordscout_shared::{
    DomainContext, KeywordMetrics, KeywordScoutError, PersistedKeyword, ResearchParams,
    ResearchRun, Result, RunId, normalize_keyword,
};
use keywordscout_sources::{AutocompleteSource, CompetitorMiner, SerpSource};
use keywordscout_storage::Storage;

use crate::chat::ChatModel;
use crate::relevance::{Confidence, DefaultReason, classify_relevance};
use crate::seeds::generate_seeds;

// ---------------------------------------------------------------------------
// Request / outcome / collaborators
// ---------------------------------------------------------------------------

/// A request to run keyword research for one domain context.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    /// What we know about the target domain.
    pub context: DomainContext,
    /// Pipeline tuning parameters.
    pub params: ResearchParams,
}

/// Summary of a completed research run.
#[derive(Debug)]
pub struct ResearchOutcome {
    /// The run's identifier.
    pub run_id: RunId,
    /// Unique candidates found before top-N truncation.
    pub total_found: usize,
    /// Keyword rows persisted.
    pub persisted: usize,
    /// Multi-member clusters formed.
    pub clusters: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// The external collaborators a research run consumes.
pub struct Collaborators {
    /// Chat model for seed generation and relevance classification.
    pub chat: Arc<dyn ChatModel>,
    /// Embedding provider for similarity and clustering.
    pub embeddings: Arc<dyn EmbeddingProvider>,
    /// Autocomplete suggestion source.
    pub autocomplete: Arc<dyn AutocompleteSource>,
    /// SERP-adjacent phrase source.
    pub serp: Arc<dyn SerpSource>,
    /// Competitor domain miner.
    pub competitors: Arc<dyn CompetitorMiner>,
    /// Optional real ads-metrics backend.
    pub ads: Arc<dyn AdsMetricsProvider>,
}

/// Progress callback for reporting run status to a frontend.
pub trait ProgressSink: Send + Sync {
    /// Called for every progress log entry, with its nesting level.
    fn stage(&self, message: &str, indent: u8);
}

/// No-op progress sink for headless/test usage.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn stage(&self, _message: &str, _indent: u8) {}
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run one research pipeline to a terminal state.
///
/// Creates the durable run record, executes all stages, and returns the
/// summary. On any stage error the run is marked `failed` with the message
/// and the error is returned to the caller.
#[instrument(skip_all, fields(domain = %request.context.domain()))]
pub async fn run_research(
    request: &ResearchRequest,
    collab: &Collaborators,
    storage: &Storage,
    progress: &dyn ProgressSink,
) -> Result<ResearchOutcome> {
    let start = Instant::now();

    let run = ResearchRun::new(request.context.domain(), request.context.niche());
    let run_id = run.id.clone();
    storage.insert_run(&run).await?;
    storage.mark_processing(&run_id).await?;

    info!(%run_id, "research run started");

    match run_stages(request, collab, storage, progress, &run_id).await {
        Ok(summary) => {
            storage
                .mark_completed(&run_id, summary.total_found as i64)
                .await?;
            log_stage(
                storage,
                progress,
                &run_id,
                &format!(
                    "Research completed: {} candidates found, {} persisted",
                    summary.total_found, summary.persisted
                ),
                0,
            )
            .await?;

            let outcome = ResearchOutcome {
                run_id: run_id.clone(),
                total_found: summary.total_found,
                persisted: summary.persisted,
                clusters: summary.clusters,
                elapsed: start.elapsed(),
            };

            info!(
                %run_id,
                total_found = outcome.total_found,
                persisted = outcome.persisted,
                clusters = outcome.clusters,
                elapsed_ms = outcome.elapsed.as_millis(),
                "research run complete"
            );
            Ok(outcome)
        }
        Err(e) => {
            warn!(%run_id, error = %e, "research run failed");
            // Best effort: the run must never stay in processing.
            let _ = log_stage(
                storage,
                progress,
                &run_id,
                &format!("Run failed: {e}"),
                0,
            )
            .await;
            if let Err(mark_err) = storage.mark_failed(&run_id, &e.to_string()).await {
                warn!(%run_id, error = %mark_err, "could not mark run failed");
            }
            Err(e)
        }
    }
}

/// Append a progress entry to storage and echo it to the sink.
async fn log_stage(
    storage: &Storage,
    progress: &dyn ProgressSink,
    run_id: &RunId,
    message: &str,
    indent: u8,
) -> Result<()> {
    progress.stage(message, indent);
    storage.append_progress(run_id, message, indent).await
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

struct StageSummary {
    total_found: usize,
    persisted: usize,
    clusters: usize,
}

async fn run_stages(
    request: &ResearchRequest,
    collab: &Collaborators,
    storage: &Storage,
    progress: &dyn ProgressSink,
    run_id: &RunId,
) -> Result<StageSummary> {
    let context = &request.context;
    let params = &request.params;

    // --- Stage 1: Seeds ---
    let supplied = context.seed_keywords();
    let seeds: Vec<String> = if supplied.is_empty() {
        log_stage(storage, progress, run_id, "Generating seed keywords", 0).await?;
        let generated = generate_seeds(collab.chat.as_ref(), context, params.seed_count).await;
        log_stage(
            storage,
            progress,
            run_id,
            &format!("Generated {} seed keywords", generated.len()),
            1,
        )
        .await?;
        generated
    } else {
        log_stage(
            storage,
            progress,
            run_id,
            &format!("Using {} supplied seed keywords", supplied.len()),
            0,
        )
        .await?;
        let mut seeds = Vec::new();
        for raw in supplied {
            if let Some(normalized) = normalize_keyword(raw) {
                if !seeds.contains(&normalized) {
                    seeds.push(normalized);
                }
            }
        }
        seeds
    };

    if seeds.is_empty() {
        return Err(KeywordScoutError::validation(
            "no usable seed keywords for this run",
        ));
    }
    storage.set_run_seeds(run_id, &seeds).await?;

    // --- Stage 2: Expansion ---
    log_stage(storage, progress, run_id, "Expanding seed keywords", 0).await?;
    let mut pool = keywordscout_shared::CandidatePool::new();

    for (i, seed) in seeds.iter().enumerate() {
        pool.add(seed, "seed");
        log_stage(
            storage,
            progress,
            run_id,
            &format!("Expanding \"{seed}\""),
            1,
        )
        .await?;

        for suggestion in collab.autocomplete.suggestions(seed).await? {
            pool.add(&suggestion, "autocomplete");
        }
        for phrase in collab.serp.related_phrases(seed).await? {
            pool.add(&phrase, "serp");
        }

        // Politeness toward third-party endpoints between seeds.
        if i + 1 < seeds.len() && params.expansion_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(params.expansion_delay_ms)).await;
        }
    }
    log_stage(
        storage,
        progress,
        run_id,
        &format!("Collected {} unique candidates", pool.len()),
        1,
    )
    .await?;

    // --- Stage 3: Relevance filtering ---
    log_stage(storage, progress, run_id, "Filtering candidates for relevance", 0).await?;
    let texts = pool.texts();
    let classifications = classify_relevance(
        collab.chat.as_ref(),
        context,
        &texts,
        params.relevance_chunk_size,
    )
    .await;

    let failed_defaults = classifications
        .values()
        .filter(|c| {
            matches!(
                c,
                crate::relevance::Classification::Defaulted {
                    reason: DefaultReason::RequestFailed
                }
            )
        })
        .count();
    if failed_defaults > 0 {
        log_stage(
            storage,
            progress,
            run_id,
            &format!(
                "Classification degraded for {failed_defaults} candidates (defaulted to medium)"
            ),
            1,
        )
        .await?;
    }

    let before = pool.len();
    pool.retain(|text| {
        classifications
            .get(text)
            .map(|c| c.confidence() != Confidence::Low)
            .unwrap_or(true)
    });
    log_stage(
        storage,
        progress,
        run_id,
        &format!("Kept {} of {before} candidates", pool.len()),
        1,
    )
    .await?;

    // --- Stage 4: Competitor mining ---
    log_stage(storage, progress, run_id, "Mining competitor domains", 0).await?;
    for domain in context.competitors() {
        let phrases = collab.competitors.mine(domain).await?;
        let mut added = 0;
        for phrase in &phrases {
            if pool.add(phrase, &format!("competitor:{domain}")) {
                added += 1;
            }
        }
        log_stage(
            storage,
            progress,
            run_id,
            &format!("{domain}: {} phrases ({added} new)", phrases.len()),
            1,
        )
        .await?;
    }

    // --- Stage 5: Metric scoring ---
    log_stage(storage, progress, run_id, "Scoring candidate metrics", 0).await?;
    let texts = pool.texts();

    // Embed the profile and every candidate once; clustering reuses these.
    let profile_text = context.profile_text();
    let base = collab
        .embeddings
        .embed_batch(&[profile_text])
        .await
        .into_iter()
        .next()
        .unwrap_or_else(|| Embedding::zero(collab.embeddings.dimension()));
    let candidate_embeddings = collab.embeddings.embed_batch(&texts).await;

    let degraded = candidate_embeddings.iter().filter(|e| e.degraded).count()
        + usize::from(base.degraded);
    if degraded > 0 {
        log_stage(
            storage,
            progress,
            run_id,
            &format!(
                "Embedding provider degraded ({degraded}/{} vectors)",
                texts.len() + 1
            ),
            1,
        )
        .await?;
    }

    let mut similarities: HashMap<String, f32> = HashMap::with_capacity(texts.len());
    let mut embeddings_by_text: HashMap<String, Vec<f32>> = HashMap::with_capacity(texts.len());
    for (text, embedding) in texts.iter().zip(candidate_embeddings) {
        similarities.insert(text.clone(), cosine_similarity(&base.values, &embedding.values));
        embeddings_by_text.insert(text.clone(), embedding.values);
    }

    let ads_map = collab.ads.metrics_batch(&texts).await;
    log_stage(
        storage,
        progress,
        run_id,
        if ads_map.is_some() {
            "Using ads metrics provider"
        } else {
            "Using heuristic metric estimates"
        },
        1,
    )
    .await?;

    let mut scored: Vec<(keywordscout_shared::KeywordCandidate, KeywordMetrics)> = Vec::new();
    for candidate in pool.into_candidates() {
        let mut metrics = match ads_map.as_ref().and_then(|m| m.get(&candidate.text)) {
            // Provider numbers win outright for keywords it covers.
            Some(ads) => KeywordMetrics {
                volume: Some(ads.volume),
                difficulty: Some(ads.difficulty),
                cpc: Some(ads.cpc),
                intent: classify_intent(&candidate.text),
                opportunity: None,
            },
            None => estimate_metrics(&candidate.text),
        };
        metrics.opportunity = opportunity_score(
            metrics.volume,
            metrics.difficulty,
            similarities.get(&candidate.text).copied(),
            metrics.intent,
        );
        scored.push((candidate, metrics));
    }

    // --- Stage 6: Rank & persist ---
    log_stage(storage, progress, run_id, "Ranking and persisting top candidates", 0).await?;
    let total_found = scored.len();
    // Stable sort: ties keep discovery order.
    scored.sort_by(|a, b| {
        b.1.opportunity
            .unwrap_or(0)
            .cmp(&a.1.opportunity.unwrap_or(0))
    });

    let mut persisted: Vec<PersistedKeyword> = Vec::new();
    for (candidate, metrics) in scored.into_iter().take(params.max_keywords) {
        let row = PersistedKeyword {
            id: Uuid::now_v7().to_string(),
            run_id: run_id.to_string(),
            text: candidate.text,
            volume: metrics.volume,
            difficulty: metrics.difficulty,
            cpc: metrics.cpc,
            opportunity: metrics.opportunity,
            intent: metrics.intent,
            sources: candidate.sources.into_iter().collect(),
            cluster_id: None,
            is_representative: false,
            cluster_size: 1,
            cluster_siblings: Vec::new(),
            created_at: Utc::now(),
        };
        storage.insert_keyword(&row).await?;
        persisted.push(row);
    }
    log_stage(
        storage,
        progress,
        run_id,
        &format!("Persisted top {} of {total_found} candidates", persisted.len()),
        1,
    )
    .await?;

    // --- Stage 7: Clustering enrichment over the persisted rows ---
    log_stage(storage, progress, run_id, "Clustering persisted keywords", 0).await?;
    let items: Vec<ClusterItem> = persisted
        .iter()
        .map(|kw| ClusterItem {
            text: kw.text.clone(),
            volume: kw.volume,
            opportunity: kw.opportunity,
            embedding: embeddings_by_text.get(&kw.text).cloned().unwrap_or_default(),
        })
        .collect();

    let cluster_params = ClusterParams {
        similarity_threshold: params.similarity_threshold,
        max_cluster_size: params.max_cluster_size,
        max_passes: params.max_merge_passes,
    };
    let outcome = build_clusters(&items, &cluster_params);
    log_stage(
        storage,
        progress,
        run_id,
        &format!("Merge loop finished after {} passes", outcome.passes),
        1,
    )
    .await?;

    for group in &outcome.groups {
        let representative = group.representative;
        let siblings: Vec<String> = group
            .members
            .iter()
            .filter(|&&m| m != representative)
            .map(|&m| items[m].text.clone())
            .collect();

        storage
            .annotate_cluster_representative(
                &persisted[representative].id,
                group.id,
                group.members.len() as i64,
                &siblings,
            )
            .await?;
        for &member in &group.members {
            if member != representative {
                storage
                    .annotate_cluster_member(&persisted[member].id, group.id)
                    .await?;
            }
        }
    }
    log_stage(
        storage,
        progress,
        run_id,
        &format!(
            "{} clusters, {} singletons",
            outcome.groups.len(),
            outcome.singletons.len()
        ),
        1,
    )
    .await?;

    Ok(StageSummary {
        total_found,
        persisted: persisted.len(),
        clusters: outcome.groups.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
