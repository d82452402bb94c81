//! Keyword metric estimation and opportunity scoring for KeywordScout.
//!
//! Heuristic volume/difficulty/CPC/intent estimation as pure functions of
//! the keyword text, a seam for a real ads-data provider, and the composite
//! opportunity score used to rank candidates.

pub mod estimator;
pub mod opportunity;
pub mod provider;

pub use estimator::{
    classify_intent, estimate_cpc, estimate_difficulty, estimate_metrics, estimate_volume,
};
pub use opportunity::opportunity_score;
pub use provider::{AdsMetrics, AdsMetricsProvider, UnconfiguredAdsProvider};
