// src/range_planner.rs
// Planning for LP entry: choose a tick range around the current price and
// size a fix-one-side deposit for it. Pure planning, no submission; the
// resulting params go to a `TxSubmitter` implementation.

use crate::chain::{AddLiquidityParams, ClmmPoolState, OpenPositionParams};
use crate::clmm_math;
use crate::errors::{SdkError, SdkResult};
use crate::tick_math;
use log::debug;

/// Smallest initializable range straddling `current_tick`.
///
/// Normally one spacing-aligned band: the nearest initializable tick at or
/// below the current tick, and the one strictly above it. When the current
/// tick sits exactly on a spacing multiple the floor and ceiling coincide, so
/// the range is widened by one spacing per side to keep it non-degenerate.
/// Both ends stay inside the valid tick domain.
pub fn symmetric_range(current_tick: i32, tick_spacing: u32) -> SdkResult<(i32, i32)> {
    let mut lower = tick_math::prev_initializable_tick(current_tick, tick_spacing)?;
    let mut upper = tick_math::next_initializable_tick(current_tick, tick_spacing)?;
    if lower == upper {
        let spacing = tick_spacing as i32;
        let below = current_tick.saturating_sub(spacing).max(tick_math::MIN_TICK);
        let above = current_tick.saturating_add(spacing).min(tick_math::MAX_TICK);
        lower = tick_math::prev_initializable_tick(below, tick_spacing)?;
        upper = tick_math::next_initializable_tick(above, tick_spacing)?;
    }
    if lower >= upper {
        return Err(SdkError::InvalidRange(format!(
            "degenerate planned range [{}, {}] at tick {} spacing {}",
            lower, upper, current_tick, tick_spacing
        )));
    }
    Ok((lower, upper))
}

/// Plan a new position in `pool` around its current price.
pub fn plan_open_position(pool: &ClmmPoolState) -> SdkResult<OpenPositionParams> {
    let (tick_lower_index, tick_upper_index) =
        symmetric_range(pool.current_tick_index, pool.tick_spacing)?;
    debug!(
        "planned range [{}, {}] for pool {} (tick {}, spacing {})",
        tick_lower_index,
        tick_upper_index,
        pool.pool_address,
        pool.current_tick_index,
        pool.tick_spacing
    );
    Ok(OpenPositionParams {
        pool_address: pool.pool_address.clone(),
        tick_lower_index,
        tick_upper_index,
    })
}

/// Plan a fix-one-side liquidity add into the symmetric range around the
/// current price. `fixed_amount` is in base units of the fixed token;
/// `slippage` is a fraction in `[0, 1)`.
pub fn plan_add_liquidity(
    pool: &ClmmPoolState,
    fixed_amount: u128,
    fix_amount_a: bool,
    slippage: f64,
) -> SdkResult<AddLiquidityParams> {
    let (tick_lower_index, tick_upper_index) =
        symmetric_range(pool.current_tick_index, pool.tick_spacing)?;

    // Deposits round up so the planned liquidity is always covered.
    let input = clmm_math::est_liquidity_and_amounts_from_one_amount(
        tick_lower_index,
        tick_upper_index,
        fixed_amount,
        fix_amount_a,
        true,
        slippage,
        pool.current_sqrt_price,
    )?;

    Ok(AddLiquidityParams {
        pool_address: pool.pool_address.clone(),
        tick_lower_index,
        tick_upper_index,
        amount_a: input.amount_a,
        amount_b: input.amount_b,
        amount_a_max: input.amount_a_max,
        amount_b_max: input.amount_b_max,
        fix_amount_a: input.fix_amount_a,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::{MAX_TICK, MIN_TICK};

    fn pool(tick: i32, spacing: u32) -> ClmmPoolState {
        ClmmPoolState {
            pool_address: "pool".to_string(),
            coin_type_a: "0xa::usdc::USDC".to_string(),
            coin_type_b: "0xb::usdt::USDT".to_string(),
            current_tick_index: tick,
            current_sqrt_price: 1u128 << 64,
            tick_spacing: spacing,
        }
    }

    #[test]
    fn test_range_straddles_current_tick() {
        let (lower, upper) = symmetric_range(130, 60).unwrap();
        assert_eq!((lower, upper), (120, 180));
        assert!(lower <= 130 && 130 < upper);
    }

    #[test]
    fn test_exact_multiple_widens_one_spacing_each_side() {
        let (lower, upper) = symmetric_range(120, 60).unwrap();
        assert_eq!((lower, upper), (60, 180));
    }

    #[test]
    fn test_negative_tick_floors_toward_negative_infinity() {
        let (lower, upper) = symmetric_range(-130, 60).unwrap();
        assert_eq!((lower, upper), (-180, -120));
    }

    #[test]
    fn test_range_clamps_at_domain_edges() {
        let (lower, upper) = symmetric_range(MAX_TICK - 1, 60).unwrap();
        assert!(upper <= MAX_TICK);
        assert!(lower < upper);

        let (lower, upper) = symmetric_range(MIN_TICK + 1, 60).unwrap();
        assert!(lower >= MIN_TICK);
        assert!(lower < upper);
    }

    #[test]
    fn test_zero_spacing_rejected() {
        assert!(matches!(
            symmetric_range(100, 0),
            Err(SdkError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_plan_open_position_uses_pool_state() {
        let params = plan_open_position(&pool(130, 60)).unwrap();
        assert_eq!(params.pool_address, "pool");
        assert_eq!(params.tick_lower_index, 120);
        assert_eq!(params.tick_upper_index, 180);
    }

    #[test]
    fn test_plan_add_liquidity_fixed_side_is_exact() {
        let fixed = 1_000_000_000u128;
        let params = plan_add_liquidity(&pool(130, 2), fixed, true, 0.01).unwrap();
        assert!(params.fix_amount_a);
        // Liquidity sizing floors, recomputation rounds up: the planned
        // amount tracks the fixed amount to within rounding.
        assert!(params.amount_a <= fixed + 1);
        assert!(params.amount_a >= fixed - fixed / 1000);
        assert!(params.amount_b > 0);
        // Ceilings carry the slippage headroom.
        assert!(params.amount_a_max >= params.amount_a);
        assert!(params.amount_b_max >= params.amount_b);
    }

    #[test]
    fn test_plan_add_liquidity_rejects_bad_slippage() {
        let err = plan_add_liquidity(&pool(130, 2), 1_000_000, true, 1.2).unwrap_err();
        assert!(matches!(err, SdkError::InvalidSlippage(_)));
    }
}
