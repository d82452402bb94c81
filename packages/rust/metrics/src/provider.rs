//! Optional real ads-data provider seam.
//!
//! When a provider is configured its numbers take precedence over the
//! heuristics for any keyword it covers — the two are never blended for the
//! same keyword.

use std::collections::HashMap;

use async_trait::async_trait;

/// Metrics returned by a real ads-data provider for one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct AdsMetrics {
    /// Monthly search volume.
    pub volume: u32,
    /// Ranking difficulty, 0–100.
    pub difficulty: u8,
    /// Cost-per-click in dollars.
    pub cpc: f64,
}

/// A real ads-metrics backend.
///
/// Returns `None` when the provider is unconfigured or the lookup failed —
/// the caller falls back to heuristics for the whole batch in that case.
/// Keywords missing from a `Some` map fall back individually.
#[async_trait]
pub trait AdsMetricsProvider: Send + Sync {
    /// Look up metrics for a batch of keywords.
    async fn metrics_batch(&self, keywords: &[String]) -> Option<HashMap<String, AdsMetrics>>;
}

/// The no-provider default: every lookup yields `None`.
pub struct UnconfiguredAdsProvider;

#[async_trait]
impl AdsMetricsProvider for UnconfiguredAdsProvider {
    async fn metrics_batch(&self, _keywords: &[String]) -> Option<HashMap<String, AdsMetrics>> {
        None
    }
}
