//! # Sui Liquidity SDK
//!
//! A Rust library for yield discovery and concentrated-liquidity position
//! management on Sui. It combines DeFiLlama market data with Cetus CLMM
//! fixed-point math to rank pools, value existing positions and plan new
//! liquidity deposits.
//!
//! ## Overview
//!
//! The SDK separates market data plumbing from the deterministic math core:
//!
//! - **Market data**: resilient, cached clients for the DeFiLlama yields,
//!   prices, protocols and TVL feeds, and the Cetus pool statistics feed.
//!   Every fetch gets TTL caching, retry with exponential backoff and
//!   stale-on-failure fallback.
//! - **Ranking**: pure filter/sort views over pool snapshots (top APY, top
//!   volume, top stablecoin).
//! - **CLMM math**: tick index to X64 sqrt-price conversion and the
//!   liquidity/amount relations, all in integer arithmetic.
//! - **Positions**: portfolio valuation against live pool state, with
//!   per-position failure isolation.
//! - **Planning**: tick-range selection and fix-one-side deposit sizing with
//!   slippage-bounded maxima.
//!
//! Chain access sits behind traits ([`chain::PoolStateSource`],
//! [`chain::PositionSource`], [`chain::TxSubmitter`]); the SDK never signs or
//! submits anything itself.

// Core Types
/// DeFiLlama yields feed data model
pub mod pools;
/// On-chain pool/position types and chain-access traits
pub mod chain;
/// Coin type -> token symbol/decimals resolution
pub mod token_registry;

// Market Data Layer
/// TTL cache with retry, backoff and stale fallback
pub mod fetch_cache;
/// DeFiLlama HTTP client (yields, prices, protocols, TVL history)
pub mod llama_client;
/// Cetus pool statistics client (APR breakdown)
pub mod cetus_client;
/// Protocol TVL views and trend analysis
pub mod protocols;
/// Pool ranking views (top APY, top volume, top stablecoin)
pub mod rankings;

// CLMM Math Core
/// Tick index <-> X64 sqrt price conversion
pub mod tick_math;
/// Liquidity <-> token amount relations and deposit sizing
pub mod clmm_math;

// Position Management
/// Portfolio valuation over live pool state
pub mod positions;
/// Tick-range selection and deposit planning
pub mod range_planner;

// Settings & Errors
/// Configuration management
pub mod settings;
/// Error types
pub mod errors;

// Re-exports for convenience
pub use cetus_client::CetusStatsClient;
pub use errors::{SdkError, SdkResult};
pub use fetch_cache::{FetchCache, Fetched};
pub use llama_client::LlamaClient;
pub use positions::PositionValuer;
pub use settings::Settings;
