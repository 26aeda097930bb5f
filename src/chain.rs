// src/chain.rs
// On-chain data model for Cetus CLMM pools and positions, plus the traits
// behind which chain access sits. The SDK itself never talks RPC; embedders
// implement these traits over their own Sui client and tests use in-memory
// fakes.

use crate::errors::SdkResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Snapshot of a CLMM pool's pricing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClmmPoolState {
    pub pool_address: String,
    pub coin_type_a: String,
    pub coin_type_b: String,
    pub current_tick_index: i32,
    /// sqrt(price) in X64 fixed point.
    pub current_sqrt_price: u128,
    pub tick_spacing: u32,
}

/// One liquidity position as read from chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub pool_address: String,
    pub coin_type_a: String,
    pub coin_type_b: String,
    pub liquidity: u128,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
}

/// Parameters for opening a fresh position around the current price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPositionParams {
    pub pool_address: String,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
}

/// Parameters for a fix-one-side liquidity add, amounts in base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub pool_address: String,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
    pub amount_a: u128,
    pub amount_b: u128,
    /// Slippage-inflated ceilings the transaction must not exceed.
    pub amount_a_max: u128,
    pub amount_b_max: u128,
    pub fix_amount_a: bool,
}

/// Transaction digest returned by a submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDigest(pub String);

/// Read access to pool pricing state.
#[async_trait]
pub trait PoolStateSource: Send + Sync {
    async fn pool_state(&self, pool_address: &str) -> SdkResult<ClmmPoolState>;
}

/// Read access to an owner's positions.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn positions(&self, owner: &str) -> SdkResult<Vec<Position>>;
}

/// Transaction submission. Planning and submission are split so plans can be
/// inspected, logged or simulated before anything signs.
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    async fn open_position(&self, params: &OpenPositionParams) -> SdkResult<TxDigest>;
    async fn add_liquidity(&self, params: &AddLiquidityParams) -> SdkResult<TxDigest>;
}
