// src/cetus_client.rs
// Client for the Cetus pool statistics feed (swap counts and APR breakdown
// per pool). One cached fetch covers the whole pool list; lookups match on
// the pool's swap account address.

use crate::errors::{SdkError, SdkResult};
use crate::fetch_cache::{FetchCache, Fetched};
use crate::settings::Settings;
use serde::Deserialize;
use std::time::Duration;

/// APR breakdown for one Cetus pool. The feed serializes percentages as
/// strings ("12.34") or numbers depending on the field and version.
#[derive(Debug, Clone, Deserialize)]
pub struct CetusPoolApr {
    pub swap_account: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "de_flexible_f64")]
    pub apr_24h: f64,
    #[serde(default, deserialize_with = "de_flexible_f64")]
    pub apr_7day: f64,
    #[serde(default, deserialize_with = "de_flexible_f64")]
    pub apr_30day: f64,
    #[serde(default, deserialize_with = "de_flexible_f64")]
    pub total_apr: f64,
    #[serde(default)]
    pub rewarder_apr: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatsData {
    pools: Vec<CetusPoolApr>,
}

#[derive(Debug, Deserialize)]
struct StatsEnvelope {
    data: StatsData,
}

/// Cetus statistics client with a cached pool list.
pub struct CetusStatsClient {
    http: reqwest::Client,
    stats_url: String,
    stats_cache: FetchCache<Vec<CetusPoolApr>>,
}

impl CetusStatsClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.endpoints.http_timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            stats_url: settings.endpoints.cetus_stats_url.clone(),
            stats_cache: FetchCache::with_policy(
                Duration::from_secs(settings.cache.stats_ttl_seconds),
                settings.cache.retry_policy(),
            ),
        })
    }

    /// All pools from the stats feed.
    pub async fn all_pool_stats(&self) -> SdkResult<Fetched<Vec<CetusPoolApr>>> {
        let url = self.stats_url.clone();
        let http = self.http.clone();
        self.stats_cache
            .get_or_fetch("cetus:stats", move || {
                let url = url.clone();
                let http = http.clone();
                async move {
                    let resp = http.get(&url).send().await.map_err(|e| {
                        SdkError::FetchFailed {
                            key: "cetus:stats".to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    let resp = resp.error_for_status().map_err(|e| SdkError::FetchFailed {
                        key: "cetus:stats".to_string(),
                        reason: e.to_string(),
                    })?;
                    let envelope: StatsEnvelope =
                        resp.json().await.map_err(|e| SdkError::FetchFailed {
                            key: "cetus:stats".to_string(),
                            reason: format!("decode: {}", e),
                        })?;
                    Ok(envelope.data.pools)
                }
            })
            .await
    }

    /// APR breakdown for one pool, matched by swap account address.
    pub async fn pool_apr(&self, pool_address: &str) -> SdkResult<Fetched<CetusPoolApr>> {
        let fetched = self.all_pool_stats().await?;
        let matched = fetched
            .data
            .iter()
            .find(|p| p.swap_account.eq_ignore_ascii_case(pool_address))
            .cloned()
            .ok_or_else(|| SdkError::PoolNotFound(pool_address.to_string()))?;
        Ok(Fetched {
            data: matched,
            stale: fetched.stale,
            fetched_at: fetched.fetched_at,
        })
    }
}

fn de_flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(D::Error::custom),
    }
}
