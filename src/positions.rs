// src/positions.rs
// Portfolio valuation for CLMM positions: convert each position's liquidity
// into token amounts at the pool's current price, then into USD.
//
// Failures are per-position: a pool whose state cannot be read (or whose
// ticks are corrupt) is skipped with a warning and counted, and the rest of
// the portfolio still values. Per-token sums accumulate in raw base units so
// the result is independent of position order; floating point enters once per
// token, at the end.

use crate::chain::{PoolStateSource, Position};
use crate::clmm_math;
use crate::errors::{SdkError, SdkResult};
use crate::tick_math;
use crate::token_registry::{self, ResolvedToken};
use futures::future::join_all;
use log::warn;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One position valued at the pool's current price.
#[derive(Debug, Clone)]
pub struct ValuedPosition {
    pub pool_address: String,
    pub symbol_a: String,
    pub symbol_b: String,
    /// Display-unit amounts (raw scaled by token decimals).
    pub amount_a: f64,
    pub amount_b: f64,
    pub value_usd: f64,
    /// The position's tick range and raw liquidity, carried through so
    /// callers can display the range without re-reading chain state.
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Whether the pool's current tick sits inside the position's range.
    pub in_range: bool,
}

/// Cross-position totals, keyed by display symbol.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSummary {
    pub per_token_totals: BTreeMap<String, f64>,
    pub total_value_usd: f64,
}

/// Result of valuing a batch of positions.
#[derive(Debug, Clone)]
pub struct ValuationOutcome {
    pub positions: Vec<ValuedPosition>,
    pub summary: PortfolioSummary,
    /// Positions dropped because their pool state or math failed.
    pub skipped: usize,
}

// Raw per-token accumulator: base units plus decimals for the final scale.
struct TokenBucket {
    raw: u128,
    decimals: u8,
}

/// Values positions against a pool-state source and a spot-price map.
pub struct PositionValuer<S: PoolStateSource> {
    source: Arc<S>,
}

impl<S: PoolStateSource> PositionValuer<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Value `positions` in parallel. `spot_prices` is keyed by display
    /// symbol (e.g. "SUI"); a missing price falls back to 1.0 for known
    /// stables and 0.0 otherwise.
    pub async fn value_positions(
        &self,
        positions: &[Position],
        spot_prices: &BTreeMap<String, f64>,
    ) -> ValuationOutcome {
        let computed = join_all(
            positions
                .iter()
                .map(|position| self.compute_amounts(position)),
        )
        .await;

        let mut valued = Vec::with_capacity(positions.len());
        let mut buckets: BTreeMap<String, TokenBucket> = BTreeMap::new();
        let mut skipped = 0usize;

        for (position, result) in positions.iter().zip(computed) {
            let amounts = match result {
                Ok(a) => a,
                Err(err) => {
                    warn!(
                        "skipping position in pool {}: {}",
                        position.pool_address, err
                    );
                    skipped += 1;
                    continue;
                }
            };

            let token_a = token_registry::resolve_coin_type(&position.coin_type_a);
            let token_b = token_registry::resolve_coin_type(&position.coin_type_b);

            accumulate(&mut buckets, &token_a, amounts.raw_a);
            accumulate(&mut buckets, &token_b, amounts.raw_b);

            let amount_a = scale_raw(amounts.raw_a, token_a.decimals());
            let amount_b = scale_raw(amounts.raw_b, token_b.decimals());
            let value_usd = amount_a * price_for(&token_a, spot_prices)
                + amount_b * price_for(&token_b, spot_prices);

            valued.push(ValuedPosition {
                pool_address: position.pool_address.clone(),
                symbol_a: token_a.symbol().to_string(),
                symbol_b: token_b.symbol().to_string(),
                amount_a,
                amount_b,
                value_usd,
                tick_lower: position.tick_lower_index,
                tick_upper: position.tick_upper_index,
                liquidity: position.liquidity,
                in_range: amounts.in_range,
            });
        }

        let mut per_token_totals = BTreeMap::new();
        let mut total_value_usd = 0.0;
        for (symbol, bucket) in &buckets {
            let amount = scale_raw(bucket.raw, bucket.decimals);
            per_token_totals.insert(symbol.clone(), amount);
            total_value_usd += amount * price_for_symbol(symbol, spot_prices);
        }

        ValuationOutcome {
            positions: valued,
            summary: PortfolioSummary {
                per_token_totals,
                total_value_usd,
            },
            skipped,
        }
    }

    async fn compute_amounts(&self, position: &Position) -> SdkResult<PositionAmounts> {
        let pool = self.source.pool_state(&position.pool_address).await?;

        let lower_sqrt = tick_math::tick_index_to_sqrt_price_x64(position.tick_lower_index)
            .map_err(|e| processing_error(position, &e))?;
        let upper_sqrt = tick_math::tick_index_to_sqrt_price_x64(position.tick_upper_index)
            .map_err(|e| processing_error(position, &e))?;

        // Valuation rounds down: reporting must never overstate holdings.
        let (raw_a, raw_b) = clmm_math::coin_amounts_from_liquidity(
            position.liquidity,
            pool.current_sqrt_price,
            lower_sqrt,
            upper_sqrt,
            false,
        )
        .map_err(|e| processing_error(position, &e))?;

        Ok(PositionAmounts {
            raw_a,
            raw_b,
            in_range: position.tick_lower_index <= pool.current_tick_index
                && pool.current_tick_index < position.tick_upper_index,
        })
    }
}

struct PositionAmounts {
    raw_a: u128,
    raw_b: u128,
    in_range: bool,
}

fn processing_error(position: &Position, err: &SdkError) -> SdkError {
    SdkError::PositionProcessingFailed {
        pool: position.pool_address.clone(),
        reason: err.to_string(),
    }
}

fn accumulate(buckets: &mut BTreeMap<String, TokenBucket>, token: &ResolvedToken, raw: u128) {
    let bucket = buckets
        .entry(token.symbol().to_string())
        .or_insert(TokenBucket {
            raw: 0,
            decimals: token.decimals(),
        });
    bucket.raw = bucket.raw.saturating_add(raw);
}

fn scale_raw(raw: u128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

fn price_for(token: &ResolvedToken, spot_prices: &BTreeMap<String, f64>) -> f64 {
    if let Some(price) = spot_prices.get(token.symbol()) {
        return *price;
    }
    if token.is_stable() || token_registry::is_stable_symbol(token.symbol()) {
        warn!("no spot price for stable {}, assuming 1.0", token.symbol());
        1.0
    } else {
        warn!("no spot price for {}, valuing at 0.0", token.symbol());
        0.0
    }
}

fn price_for_symbol(symbol: &str, spot_prices: &BTreeMap<String, f64>) -> f64 {
    if let Some(price) = spot_prices.get(symbol) {
        return *price;
    }
    if token_registry::is_stable_symbol(symbol) {
        1.0
    } else {
        0.0
    }
}
