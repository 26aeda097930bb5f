use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::fetch_cache::RetryPolicy;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Endpoints {
    #[serde(default = "default_yields_url")]
    pub yields_url: String,
    #[serde(default = "default_prices_url")]
    pub prices_url: String,
    #[serde(default = "default_protocols_url")]
    pub protocols_url: String,
    #[serde(default = "default_charts_url")]
    pub charts_url: String,
    #[serde(default = "default_cetus_stats_url")]
    pub cetus_stats_url: String,
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
}

fn default_yields_url() -> String {
    "https://yields.llama.fi/pools".to_string()
}
fn default_prices_url() -> String {
    "https://coins.llama.fi/prices/current".to_string()
}
fn default_protocols_url() -> String {
    "https://api.llama.fi/protocols".to_string()
}
fn default_charts_url() -> String {
    "https://api.llama.fi/v2/historicalChainTvl".to_string()
}
fn default_cetus_stats_url() -> String {
    "https://api-sui.cetus.zone/v2/sui/swap/count".to_string()
}
fn default_http_timeout_seconds() -> u64 {
    15
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            yields_url: default_yields_url(),
            prices_url: default_prices_url(),
            protocols_url: default_protocols_url(),
            charts_url: default_charts_url(),
            cetus_stats_url: default_cetus_stats_url(),
            http_timeout_seconds: default_http_timeout_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_pools_ttl_seconds")]
    pub pools_ttl_seconds: u64,
    #[serde(default = "default_prices_ttl_seconds")]
    pub prices_ttl_seconds: u64,
    #[serde(default = "default_protocols_ttl_seconds")]
    pub protocols_ttl_seconds: u64,
    #[serde(default = "default_stats_ttl_seconds")]
    pub stats_ttl_seconds: u64,
    #[serde(default = "default_fetch_retries")]
    pub retries: usize,
    #[serde(default = "default_fetch_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_fetch_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_pools_ttl_seconds() -> u64 {
    300 // 5 minutes
}
fn default_prices_ttl_seconds() -> u64 {
    60
}
fn default_protocols_ttl_seconds() -> u64 {
    600
}
fn default_stats_ttl_seconds() -> u64 {
    300
}
fn default_fetch_retries() -> usize {
    3
}
fn default_fetch_base_delay_ms() -> u64 {
    1000
}
fn default_fetch_max_delay_ms() -> u64 {
    10_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            pools_ttl_seconds: default_pools_ttl_seconds(),
            prices_ttl_seconds: default_prices_ttl_seconds(),
            protocols_ttl_seconds: default_protocols_ttl_seconds(),
            stats_ttl_seconds: default_stats_ttl_seconds(),
            retries: default_fetch_retries(),
            base_delay_ms: default_fetch_base_delay_ms(),
            max_delay_ms: default_fetch_max_delay_ms(),
        }
    }
}

impl CacheSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingSettings {
    #[serde(default = "default_min_tvl_usd")]
    pub min_tvl_usd: f64,
    #[serde(default = "default_apy_ceiling")]
    pub apy_ceiling: f64,
    #[serde(default = "default_stable_apy_ceiling")]
    pub stable_apy_ceiling: f64,
    #[serde(default)]
    pub min_volume_usd: f64,
    #[serde(default = "default_ranking_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub chain: Option<String>,
}

fn default_min_tvl_usd() -> f64 {
    1_000_000.0
}
fn default_apy_ceiling() -> f64 {
    1000.0 // APYs above this are feed noise
}
fn default_stable_apy_ceiling() -> f64 {
    100.0
}
fn default_ranking_top_n() -> usize {
    5
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            min_tvl_usd: default_min_tvl_usd(),
            apy_ceiling: default_apy_ceiling(),
            stable_apy_ceiling: default_stable_apy_ceiling(),
            min_volume_usd: 0.0,
            top_n: default_ranking_top_n(),
            chain: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LogSettings {
    /// Install an `env_logger` at the configured level. `RUST_LOG` wins when
    /// set; repeated calls are no-ops (safe in tests and embedders).
    pub fn init(&self) {
        let mut builder = env_logger::Builder::from_default_env();
        if std::env::var("RUST_LOG").is_err() {
            builder.parse_filters(&self.level);
        }
        let _ = builder.try_init();
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl Settings {
    /// Layered load: optional `Config.toml` in the working directory, then
    /// `SUI_SDK__*` environment overrides (e.g. `SUI_SDK__RANKING__TOP_N=3`).
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("Config").required(false))
            .add_source(Environment::with_prefix("SUI_SDK").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
