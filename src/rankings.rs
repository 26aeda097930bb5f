// src/rankings.rs
// Ranking views over DeFiLlama pool lists. Pure and stateless: filter, stable
// sort, take N. Callers render an empty result however they like; it is never
// an error here.

use crate::pools::YieldPool;
use crate::settings::Settings;
use std::cmp::Ordering;

/// Thresholds for the ranking views.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// Pools below this TVL are ignored by every view.
    pub min_tvl_usd: f64,
    /// APYs at or above this are treated as feed noise (manipulated or
    /// illiquid pools) and excluded outright, not merely deprioritized.
    pub apy_ceiling: f64,
    /// Stablecoin view uses a tighter sanity ceiling.
    pub stable_apy_ceiling: f64,
    /// Minimum 24h volume for the volume view.
    pub min_volume_usd: f64,
    /// Result size of each view.
    pub top_n: usize,
    /// Optional chain restriction, matched case-insensitively.
    pub chain: Option<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_tvl_usd: 1_000_000.0,
            apy_ceiling: 1000.0,
            stable_apy_ceiling: 100.0,
            min_volume_usd: 0.0,
            top_n: 5,
            chain: None,
        }
    }
}

impl RankingConfig {
    /// Create RankingConfig from Settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_tvl_usd: settings.ranking.min_tvl_usd,
            apy_ceiling: settings.ranking.apy_ceiling,
            stable_apy_ceiling: settings.ranking.stable_apy_ceiling,
            min_volume_usd: settings.ranking.min_volume_usd,
            top_n: settings.ranking.top_n,
            chain: settings.ranking.chain.clone(),
        }
    }

    fn chain_matches(&self, pool: &YieldPool) -> bool {
        match &self.chain {
            Some(chain) => pool.chain.eq_ignore_ascii_case(chain),
            None => true,
        }
    }
}

/// Highest-APY pools above the TVL floor, implausible APYs excluded.
pub fn top_apy_pools<'a>(pools: &'a [YieldPool], cfg: &RankingConfig) -> Vec<&'a YieldPool> {
    let mut out: Vec<&YieldPool> = pools
        .iter()
        .filter(|p| cfg.chain_matches(p))
        .filter(|p| p.tvl_usd >= cfg.min_tvl_usd && p.apy < cfg.apy_ceiling)
        .collect();
    out.sort_by(|a, b| desc(a.apy, b.apy));
    out.truncate(cfg.top_n);
    out
}

/// Highest 24h-volume pools above the TVL floor. Pools without a reported
/// volume are skipped, not treated as zero.
pub fn top_volume_pools<'a>(pools: &'a [YieldPool], cfg: &RankingConfig) -> Vec<&'a YieldPool> {
    let mut out: Vec<&YieldPool> = pools
        .iter()
        .filter(|p| cfg.chain_matches(p))
        .filter(|p| {
            matches!(p.volume_usd_1d, Some(v) if v > 0.0 && v >= cfg.min_volume_usd)
                && p.tvl_usd >= cfg.min_tvl_usd
        })
        .collect();
    out.sort_by(|a, b| desc(a.volume_usd_1d.unwrap_or(0.0), b.volume_usd_1d.unwrap_or(0.0)));
    out.truncate(cfg.top_n);
    out
}

/// Stablecoin pools scored by `apy * log10(tvl)`: yield blended with depth so
/// a freak APY on a shallow pool cannot outrank a deep, reliable one.
pub fn top_stablecoin_pools<'a>(pools: &'a [YieldPool], cfg: &RankingConfig) -> Vec<&'a YieldPool> {
    let mut out: Vec<&YieldPool> = pools
        .iter()
        .filter(|p| cfg.chain_matches(p))
        .filter(|p| p.stablecoin && p.tvl_usd >= cfg.min_tvl_usd && p.apy < cfg.stable_apy_ceiling)
        .collect();
    out.sort_by(|a, b| desc(stable_score(a), stable_score(b)));
    out.truncate(cfg.top_n);
    out
}

fn stable_score(p: &YieldPool) -> f64 {
    p.apy * p.tvl_usd.log10()
}

// Descending order; ties keep input order (sort_by is stable).
fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
