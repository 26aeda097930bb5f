// src/pools.rs
// Data model for the DeFiLlama yields feed. Snapshot-only: pools are fetched,
// ranked and discarded; there is no write path.

use serde::Deserialize;

/// Impermanent-loss risk bucket as reported by the feed. Unknown labels are
/// preserved rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IlRisk {
    Low,
    Medium,
    High,
    #[serde(other)]
    Other,
}

impl Default for IlRisk {
    fn default() -> Self {
        IlRisk::Other
    }
}

/// One pool record from the yields endpoint.
///
/// `(chain, project, symbol)` identifies a pool for display only; the feed
/// gives no global identity guarantee. Optional feed fields default to absent
/// instead of breaking the parse.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldPool {
    pub chain: String,
    pub project: String,
    pub symbol: String,
    #[serde(rename = "tvlUsd", default)]
    pub tvl_usd: f64,
    #[serde(rename = "apyBase", default)]
    pub apy_base: Option<f64>,
    #[serde(rename = "apyReward", default)]
    pub apy_reward: Option<f64>,
    #[serde(default)]
    pub apy: f64,
    #[serde(default)]
    pub stablecoin: bool,
    #[serde(rename = "volumeUsd1d", default)]
    pub volume_usd_1d: Option<f64>,
    #[serde(rename = "volumeUsd7d", default)]
    pub volume_usd_7d: Option<f64>,
    #[serde(rename = "ilRisk", default)]
    pub il_risk: IlRisk,
}

/// Envelope of the yields endpoint: `{"status": ..., "data": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct YieldsResponse {
    pub data: Vec<YieldPool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_minimal_record() {
        let json = r#"{
            "chain": "Sui",
            "project": "cetus-amm",
            "symbol": "SUI-USDC",
            "tvlUsd": 2500000.0,
            "apy": 42.5,
            "stablecoin": false,
            "ilRisk": "yes"
        }"#;
        let pool: YieldPool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.chain, "Sui");
        assert_eq!(pool.il_risk, IlRisk::Other);
        assert!(pool.apy_base.is_none());
        assert!(pool.volume_usd_1d.is_none());
    }

    #[test]
    fn test_parses_full_record_and_null_volume() {
        let json = r#"{
            "chain": "SUI",
            "project": "turbos",
            "symbol": "USDC-USDT",
            "tvlUsd": 1200000.0,
            "apyBase": 3.1,
            "apyReward": 1.4,
            "apy": 4.5,
            "stablecoin": true,
            "volumeUsd1d": null,
            "volumeUsd7d": 900000.0,
            "ilRisk": "low"
        }"#;
        let pool: YieldPool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.il_risk, IlRisk::Low);
        assert_eq!(pool.volume_usd_1d, None);
        assert_eq!(pool.volume_usd_7d, Some(900000.0));
        assert_eq!(pool.apy_base, Some(3.1));
    }
}
