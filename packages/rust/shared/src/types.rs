//! Core domain types for KeywordScout research runs.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum accepted keyword length after normalization, in characters.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Maximum accepted keyword length after normalization, in characters.
pub const MAX_KEYWORD_LEN: usize = 100;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for research run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Project profile and domain context
// ---------------------------------------------------------------------------

/// Everything known about the project a research run serves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectProfile {
    /// Primary domain (e.g., `acme.io`).
    pub domain: String,
    /// Short niche description (e.g., `developer productivity tools`).
    pub niche: String,
    /// Site title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Site meta description, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Top on-page headings, if scraped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<String>,
    /// User-supplied seed keywords (empty means "generate for me").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed_keywords: Vec<String>,
    /// Competitor domains to mine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub competitors: Vec<String>,
}

/// What we know about the domain a run targets.
///
/// Either a full project profile, or just the raw strings a caller handed us.
/// One tagged variant consumed by a single seed-generation path — there is no
/// type-sniffing anywhere downstream.
#[derive(Debug, Clone)]
pub enum DomainContext {
    /// A registered project with a scraped profile.
    Known(ProjectProfile),
    /// Ad-hoc research for a bare domain.
    Raw {
        domain: String,
        niche: String,
        competitors: Vec<String>,
    },
}

impl DomainContext {
    /// The target domain.
    pub fn domain(&self) -> &str {
        match self {
            Self::Known(p) => &p.domain,
            Self::Raw { domain, .. } => domain,
        }
    }

    /// The niche description.
    pub fn niche(&self) -> &str {
        match self {
            Self::Known(p) => &p.niche,
            Self::Raw { niche, .. } => niche,
        }
    }

    /// Competitor domains to mine.
    pub fn competitors(&self) -> &[String] {
        match self {
            Self::Known(p) => &p.competitors,
            Self::Raw { competitors, .. } => competitors,
        }
    }

    /// User-supplied seeds; empty means seed generation runs.
    pub fn seed_keywords(&self) -> &[String] {
        match self {
            Self::Known(p) => &p.seed_keywords,
            Self::Raw { .. } => &[],
        }
    }

    /// Flattened profile text used as the semantic base for similarity.
    pub fn profile_text(&self) -> String {
        match self {
            Self::Known(p) => {
                let mut parts: Vec<&str> = Vec::new();
                if let Some(title) = &p.title {
                    parts.push(title);
                }
                if let Some(desc) = &p.description {
                    parts.push(desc);
                }
                parts.push(&p.niche);
                for h in &p.headings {
                    parts.push(h);
                }
                parts.join(". ")
            }
            Self::Raw { domain, niche, .. } => format!("{niche}. {domain}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword candidates
// ---------------------------------------------------------------------------

/// Normalize a raw keyword string: lower-case, trim, enforce length bounds.
///
/// Returns `None` for strings that are unusable as keywords.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    let len = normalized.chars().count();
    if (MIN_KEYWORD_LEN..=MAX_KEYWORD_LEN).contains(&len) {
        Some(normalized)
    } else {
        None
    }
}

/// A keyword surfaced by one or more aggregation sources.
///
/// Identity is the normalized text; re-discovery from another source appends
/// to `sources`, never duplicates the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCandidate {
    /// Normalized keyword text.
    pub text: String,
    /// Every source that surfaced this keyword (e.g. `seed`, `autocomplete`,
    /// `competitor:acme.io`).
    pub sources: BTreeSet<String>,
}

impl KeywordCandidate {
    /// Create a candidate from already-normalized text and its first source.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut sources = BTreeSet::new();
        sources.insert(source.into());
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// Deduplicating pool of keyword candidates, preserving discovery order.
///
/// An explicit map with get-or-insert semantics — source accumulation is
/// visible at the call site instead of relying on implicit default values.
#[derive(Debug, Default)]
pub struct CandidatePool {
    by_text: HashMap<String, KeywordCandidate>,
    order: Vec<String>,
}

impl CandidatePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw keyword from a source. Normalizes first; rejects strings
    /// outside the length bounds. Returns `true` when the keyword was new.
    pub fn add(&mut self, raw: &str, source: &str) -> bool {
        let Some(text) = normalize_keyword(raw) else {
            return false;
        };
        match self.by_text.entry(text.clone()) {
            std::collections::hash_map::Entry::Occupied(mut e) => {
                e.get_mut().sources.insert(source.to_string());
                false
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(KeywordCandidate::new(text.clone(), source));
                self.order.push(text);
                true
            }
        }
    }

    /// Number of unique candidates.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Candidate texts in discovery order.
    pub fn texts(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Iterate candidates in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &KeywordCandidate> {
        self.order.iter().filter_map(|t| self.by_text.get(t))
    }

    /// Keep only candidates whose text satisfies the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.order.retain(|t| keep(t));
        let order: std::collections::HashSet<&String> = self.order.iter().collect();
        self.by_text.retain(|t, _| order.contains(t));
    }

    /// Consume the pool, yielding candidates in discovery order.
    pub fn into_candidates(mut self) -> Vec<KeywordCandidate> {
        self.order
            .iter()
            .filter_map(|t| self.by_text.remove(t))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Search intent and metrics
// ---------------------------------------------------------------------------

/// Searcher intent classification for a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
    Educational,
    Mixed,
}

impl SearchIntent {
    /// Stable storage string for this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::Commercial => "commercial",
            Self::Transactional => "transactional",
            Self::Navigational => "navigational",
            Self::Educational => "educational",
            Self::Mixed => "mixed",
        }
    }
}

impl std::str::FromStr for SearchIntent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "informational" => Ok(Self::Informational),
            "commercial" => Ok(Self::Commercial),
            "transactional" => Ok(Self::Transactional),
            "navigational" => Ok(Self::Navigational),
            "educational" => Ok(Self::Educational),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown search intent: {other}")),
        }
    }
}

/// Estimated (or provider-sourced) metrics for one keyword.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    /// Estimated monthly search volume.
    pub volume: Option<u32>,
    /// Ranking difficulty, 0–100.
    pub difficulty: Option<u8>,
    /// Cost-per-click estimate in dollars.
    pub cpc: Option<f64>,
    /// Searcher intent.
    #[serde(default = "default_intent")]
    pub intent: SearchIntent,
    /// Composite opportunity score, 0–100. Only present once volume and
    /// difficulty are both known.
    pub opportunity: Option<u8>,
}

fn default_intent() -> SearchIntent {
    SearchIntent::Mixed
}

impl Default for SearchIntent {
    fn default() -> Self {
        Self::Mixed
    }
}

// ---------------------------------------------------------------------------
// Persisted keywords
// ---------------------------------------------------------------------------

/// A keyword row persisted for a research run, later annotated with cluster
/// metadata by the enrichment pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedKeyword {
    /// Unique row identifier (UUID v7).
    pub id: String,
    /// Owning research run.
    pub run_id: String,
    /// Normalized keyword text.
    pub text: String,
    /// Estimated monthly search volume.
    pub volume: Option<u32>,
    /// Ranking difficulty, 0–100.
    pub difficulty: Option<u8>,
    /// Cost-per-click estimate in dollars.
    pub cpc: Option<f64>,
    /// Composite opportunity score, 0–100.
    pub opportunity: Option<u8>,
    /// Searcher intent.
    pub intent: SearchIntent,
    /// Sources that surfaced this keyword.
    pub sources: Vec<String>,
    /// Cluster this keyword belongs to, if any.
    pub cluster_id: Option<i64>,
    /// Whether this keyword represents its cluster.
    pub is_representative: bool,
    /// Member count of the cluster (1 for unclustered keywords; only the
    /// representative carries the full count).
    pub cluster_size: i64,
    /// Texts of the other cluster members (representative only).
    pub cluster_siblings: Vec<String>,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Research runs
// ---------------------------------------------------------------------------

/// Lifecycle state of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RunStatus {
    /// Stable storage string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this status is terminal (immutable once reached).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown run status: {other}")),
        }
    }
}

/// A durable research run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRun {
    /// Unique run identifier.
    pub id: RunId,
    /// Target domain.
    pub domain: String,
    /// Niche description.
    pub niche: String,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Seeds used for this run (supplied or generated).
    pub seed_keywords: Vec<String>,
    /// Unique candidate count before top-N truncation.
    pub total_found: i64,
    /// Failure message for failed runs.
    pub error_message: Option<String>,
    /// When the run row was created.
    pub created_at: DateTime<Utc>,
    /// When processing began.
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResearchRun {
    /// Create a new pending run for a domain context.
    pub fn new(domain: impl Into<String>, niche: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            domain: domain.into(),
            niche: niche.into(),
            status: RunStatus::Pending,
            seed_keywords: Vec::new(),
            total_found: 0,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

/// One line of a run's append-only progress log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    /// Monotonic sequence number within the run.
    pub seq: i64,
    /// When the entry was appended.
    pub time: DateTime<Utc>,
    /// Human-readable message.
    pub message: String,
    /// Nesting level (0 for stage headers, deeper for sub-steps).
    pub indent: u8,
}
