// src/llama_client.rs
// HTTP client for the DeFiLlama feeds (yields, spot prices, protocols, TVL
// history). Every call goes through a `FetchCache`, so callers get TTL
// caching, retry with backoff and stale fallback without thinking about it.

use crate::errors::{SdkError, SdkResult};
use crate::fetch_cache::{FetchCache, Fetched};
use crate::pools::{YieldPool, YieldsResponse};
use crate::protocols::{ProtocolTvl, TvlPoint};
use crate::settings::{Endpoints, Settings};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

// The prices feed is queried by `coingecko:<lowercased symbol>`.
fn price_feed_key(symbol: &str) -> String {
    format!("coingecko:{}", symbol.to_ascii_lowercase())
}

/// One coin entry from the prices endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinPrice {
    pub price: f64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    coins: BTreeMap<String, CoinPrice>,
}

/// DeFiLlama client with per-feed caches.
pub struct LlamaClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    pools_cache: FetchCache<Vec<YieldPool>>,
    prices_cache: FetchCache<BTreeMap<String, f64>>,
    protocols_cache: FetchCache<Vec<ProtocolTvl>>,
    charts_cache: FetchCache<Vec<TvlPoint>>,
}

impl LlamaClient {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.endpoints.http_timeout_seconds))
            .build()?;
        let policy = settings.cache.retry_policy();
        Ok(Self {
            http,
            endpoints: settings.endpoints.clone(),
            pools_cache: FetchCache::with_policy(
                Duration::from_secs(settings.cache.pools_ttl_seconds),
                policy.clone(),
            ),
            prices_cache: FetchCache::with_policy(
                Duration::from_secs(settings.cache.prices_ttl_seconds),
                policy.clone(),
            ),
            protocols_cache: FetchCache::with_policy(
                Duration::from_secs(settings.cache.protocols_ttl_seconds),
                policy.clone(),
            ),
            charts_cache: FetchCache::with_policy(
                Duration::from_secs(settings.cache.protocols_ttl_seconds),
                policy,
            ),
        })
    }

    /// All pools from the yields feed.
    pub async fn fetch_pools(&self) -> SdkResult<Fetched<Vec<YieldPool>>> {
        let url = self.endpoints.yields_url.clone();
        let http = self.http.clone();
        self.pools_cache
            .get_or_fetch("llama:pools", move || {
                let url = url.clone();
                let http = http.clone();
                async move {
                    let resp: YieldsResponse = get_json(&http, &url, "llama:pools").await?;
                    Ok(resp.data)
                }
            })
            .await
    }

    /// Spot prices for `symbols`, keyed by display symbol. A symbol the feed
    /// does not know is skipped with a warning; the rest still resolve.
    pub async fn fetch_spot_prices(
        &self,
        symbols: &[&str],
    ) -> SdkResult<Fetched<BTreeMap<String, f64>>> {
        let requested: Vec<(String, String)> = symbols
            .iter()
            .map(|s| (s.to_ascii_uppercase(), price_feed_key(s)))
            .collect();
        let joined = requested
            .iter()
            .map(|(_, id)| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/{}", self.endpoints.prices_url, joined);
        let key = format!("llama:prices:{}", joined);
        let cache_key = key.clone();

        let http = self.http.clone();
        self.prices_cache
            .get_or_fetch(&cache_key, move || {
                let url = url.clone();
                let key = key.clone();
                let http = http.clone();
                let requested = requested.clone();
                async move {
                    let resp: PricesResponse = get_json(&http, &url, &key).await?;
                    Ok(collect_prices(&requested, &resp.coins))
                }
            })
            .await
    }

    /// All protocols with their current TVL.
    pub async fn fetch_protocols(&self) -> SdkResult<Fetched<Vec<ProtocolTvl>>> {
        let url = self.endpoints.protocols_url.clone();
        let http = self.http.clone();
        self.protocols_cache
            .get_or_fetch("llama:protocols", move || {
                let url = url.clone();
                let http = http.clone();
                async move { get_json(&http, &url, "llama:protocols").await }
            })
            .await
    }

    /// Daily aggregate TVL history for one chain, oldest first.
    pub async fn fetch_tvl_history(&self, chain: &str) -> SdkResult<Fetched<Vec<TvlPoint>>> {
        let url = format!("{}/{}", self.endpoints.charts_url, chain);
        let key = format!("llama:tvl:{}", chain.to_ascii_lowercase());
        let cache_key = key.clone();
        let http = self.http.clone();
        self.charts_cache
            .get_or_fetch(&cache_key, move || {
                let url = url.clone();
                let key = key.clone();
                let http = http.clone();
                async move { get_json(&http, &url, &key).await }
            })
            .await
    }

    /// Drop the cached pool list so the next call refetches.
    pub fn invalidate_pools(&self) {
        self.pools_cache.invalidate("llama:pools");
    }
}

// Typed error at the HTTP edge; the cache layer sees it through anyhow.
async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    key: &str,
) -> anyhow::Result<T> {
    let resp = http.get(url).send().await.map_err(|e| SdkError::FetchFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    let resp = resp.error_for_status().map_err(|e| SdkError::FetchFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    let parsed = resp.json::<T>().await.map_err(|e| SdkError::FetchFailed {
        key: key.to_string(),
        reason: format!("decode: {}", e),
    })?;
    Ok(parsed)
}

fn collect_prices(
    requested: &[(String, String)],
    coins: &BTreeMap<String, CoinPrice>,
) -> BTreeMap<String, f64> {
    let mut out = BTreeMap::new();
    for (symbol, feed_key) in requested {
        match coins.get(feed_key) {
            Some(coin) => {
                out.insert(symbol.clone(), coin.price);
            }
            None => warn!("prices feed has no entry for {} ({})", symbol, feed_key),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_feed_keying() {
        assert_eq!(price_feed_key("SUI"), "coingecko:sui");
        assert_eq!(price_feed_key("usdc"), "coingecko:usdc");
    }

    #[test]
    fn test_parses_prices_envelope() {
        let json = r#"{
            "coins": {
                "coingecko:sui": {"price": 3.42, "symbol": "SUI", "timestamp": 1700000000, "confidence": 0.99},
                "coingecko:usd-coin": {"price": 0.9998}
            }
        }"#;
        let resp: PricesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.coins.len(), 2);
        assert!((resp.coins["coingecko:sui"].price - 3.42).abs() < 1e-9);
        assert!(resp.coins["coingecko:usd-coin"].symbol.is_none());
    }

    #[test]
    fn test_collect_prices_skips_missing_symbols() {
        let requested = vec![
            ("SUI".to_string(), "coingecko:sui".to_string()),
            ("DEEP".to_string(), "coingecko:deep".to_string()),
        ];
        let mut coins = BTreeMap::new();
        coins.insert(
            "coingecko:sui".to_string(),
            CoinPrice {
                price: 3.42,
                symbol: None,
                timestamp: None,
                confidence: None,
            },
        );
        let out = collect_prices(&requested, &coins);
        assert_eq!(out.len(), 1);
        assert!((out["SUI"] - 3.42).abs() < 1e-9);
        assert!(!out.contains_key("DEEP"));
    }
}
