// src/clmm_math.rs
// Liquidity <-> token amount conversions for concentrated-liquidity positions.
// All amount math is integer fixed point; floats never touch these paths.

use crate::errors::{SdkError, SdkResult};
use crate::tick_math;
use primitive_types::{U256, U512};

/// Result of sizing a deposit from one fixed token amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityInput {
    /// Liquidity bought by the fixed amount.
    pub liquidity: u128,
    /// Exact amounts the liquidity currently maps to (pre-slippage).
    pub amount_a: u128,
    pub amount_b: u128,
    /// Transaction-safe upper bounds, inflated by the slippage tolerance.
    pub amount_a_max: u128,
    pub amount_b_max: u128,
    /// Which token the caller fixed.
    pub fix_amount_a: bool,
}

/// Token amounts a position's liquidity represents at the current price.
///
/// Three-region policy: entirely token A below the range, entirely token B
/// above it, a split given by the standard CLMM formulas inside.
/// `round_up` rounds fractional remainders up (deposit sizing); valuation
/// reads pass `false`.
pub fn coin_amounts_from_liquidity(
    liquidity: u128,
    cur_sqrt_price: u128,
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    round_up: bool,
) -> SdkResult<(u128, u128)> {
    if lower_sqrt_price == 0 || lower_sqrt_price >= upper_sqrt_price {
        return Err(SdkError::InvalidRange(format!(
            "sqrt price bounds not ordered: {} >= {}",
            lower_sqrt_price, upper_sqrt_price
        )));
    }

    if cur_sqrt_price <= lower_sqrt_price {
        // Price below range: position holds only token A.
        let a = amount_a_delta(lower_sqrt_price, upper_sqrt_price, liquidity, round_up)?;
        Ok((a, 0))
    } else if cur_sqrt_price >= upper_sqrt_price {
        // Price above range: position holds only token B.
        let b = amount_b_delta(lower_sqrt_price, upper_sqrt_price, liquidity, round_up)?;
        Ok((0, b))
    } else {
        let a = amount_a_delta(cur_sqrt_price, upper_sqrt_price, liquidity, round_up)?;
        let b = amount_b_delta(lower_sqrt_price, cur_sqrt_price, liquidity, round_up)?;
        Ok((a, b))
    }
}

/// amount_a = L * 2^64 * (upper - lower) / (upper * lower)
fn amount_a_delta(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    round_up: bool,
) -> SdkResult<u128> {
    let num = (U512::from(liquidity) << 64)
        * U512::from(upper_sqrt_price - lower_sqrt_price);
    let den = U512::from(upper_sqrt_price) * U512::from(lower_sqrt_price);
    let mut q = num / den;
    if round_up && num % den != U512::zero() {
        q += U512::one();
    }
    u512_to_u128(q, "amount_a")
}

/// amount_b = L * (upper - lower) / 2^64
fn amount_b_delta(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    liquidity: u128,
    round_up: bool,
) -> SdkResult<u128> {
    let num = U256::from(liquidity) * U256::from(upper_sqrt_price - lower_sqrt_price);
    let mut q = num >> 64;
    if round_up && num & U256::from(u64::MAX) != U256::zero() {
        q += U256::one();
    }
    u256_to_u128(q, "amount_b")
}

/// Liquidity purchasable with `amount_a` of token A over a sqrt-price band:
/// L = (amount_a * upper * lower / 2^64) / (upper - lower)
pub fn estimate_liquidity_for_coin_a(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    amount_a: u128,
) -> SdkResult<u128> {
    let (lo, hi) = ordered(lower_sqrt_price, upper_sqrt_price)?;
    let num = (U512::from(amount_a) * U512::from(hi) * U512::from(lo)) >> 64;
    let den = U512::from(hi - lo);
    u512_to_u128(num / den, "liquidity_a")
}

/// Liquidity purchasable with `amount_b` of token B over a sqrt-price band:
/// L = amount_b * 2^64 / (upper - lower)
pub fn estimate_liquidity_for_coin_b(
    lower_sqrt_price: u128,
    upper_sqrt_price: u128,
    amount_b: u128,
) -> SdkResult<u128> {
    let (lo, hi) = ordered(lower_sqrt_price, upper_sqrt_price)?;
    let num = U256::from(amount_b) << 64;
    let den = U256::from(hi - lo);
    u256_to_u128(num / den, "liquidity_b")
}

/// Inverse deposit sizing: given one token's fixed amount and a tick range,
/// compute the liquidity it buys and the other token's required amount, then
/// inflate both maxima by `(1 + slippage)` for transaction safety.
///
/// `slippage` must be in `[0, 1)`. Fixing a token that is inactive for the
/// range (e.g. token B when the price sits below the range) is an error.
pub fn est_liquidity_and_amounts_from_one_amount(
    tick_lower: i32,
    tick_upper: i32,
    fixed_amount: u128,
    fix_amount_a: bool,
    round_up: bool,
    slippage: f64,
    cur_sqrt_price: u128,
) -> SdkResult<LiquidityInput> {
    if !(0.0..1.0).contains(&slippage) || !slippage.is_finite() {
        return Err(SdkError::InvalidSlippage(slippage));
    }
    if tick_lower >= tick_upper {
        return Err(SdkError::InvalidRange(format!(
            "tick_lower {} >= tick_upper {}",
            tick_lower, tick_upper
        )));
    }
    let lower_sqrt_price = tick_math::tick_index_to_sqrt_price_x64(tick_lower)?;
    let upper_sqrt_price = tick_math::tick_index_to_sqrt_price_x64(tick_upper)?;

    let liquidity = if cur_sqrt_price <= lower_sqrt_price {
        // Below range: deposits are token A only.
        if !fix_amount_a {
            return Err(SdkError::InvalidRange(
                "price below range: cannot size liquidity from token B".into(),
            ));
        }
        estimate_liquidity_for_coin_a(lower_sqrt_price, upper_sqrt_price, fixed_amount)?
    } else if cur_sqrt_price >= upper_sqrt_price {
        // Above range: deposits are token B only.
        if fix_amount_a {
            return Err(SdkError::InvalidRange(
                "price above range: cannot size liquidity from token A".into(),
            ));
        }
        estimate_liquidity_for_coin_b(lower_sqrt_price, upper_sqrt_price, fixed_amount)?
    } else if fix_amount_a {
        estimate_liquidity_for_coin_a(cur_sqrt_price, upper_sqrt_price, fixed_amount)?
    } else {
        estimate_liquidity_for_coin_b(lower_sqrt_price, cur_sqrt_price, fixed_amount)?
    };

    let (amount_a, amount_b) = coin_amounts_from_liquidity(
        liquidity,
        cur_sqrt_price,
        lower_sqrt_price,
        upper_sqrt_price,
        round_up,
    )?;

    // Integer slippage inflation in parts-per-million; never float on amounts.
    let slippage_ppm = (slippage * 1e6).round() as u64;
    Ok(LiquidityInput {
        liquidity,
        amount_a,
        amount_b,
        amount_a_max: inflate_ppm(amount_a, slippage_ppm)?,
        amount_b_max: inflate_ppm(amount_b, slippage_ppm)?,
        fix_amount_a,
    })
}

fn inflate_ppm(amount: u128, slippage_ppm: u64) -> SdkResult<u128> {
    let num = U256::from(amount) * U256::from(1_000_000u64 + slippage_ppm);
    let den = U256::from(1_000_000u64);
    let mut q = num / den;
    if num % den != U256::zero() {
        q += U256::one();
    }
    u256_to_u128(q, "slippage_inflation")
}

fn ordered(a: u128, b: u128) -> SdkResult<(u128, u128)> {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if lo == 0 || lo == hi {
        return Err(SdkError::InvalidRange(format!(
            "degenerate sqrt price band [{}, {}]",
            lo, hi
        )));
    }
    Ok((lo, hi))
}

fn u256_to_u128(v: U256, context: &'static str) -> SdkResult<u128> {
    if v > U256::from(u128::MAX) {
        tracing::warn!("u256 overflow into u128 in {}", context);
        return Err(SdkError::MathOverflow(context));
    }
    Ok(v.as_u128())
}

fn u512_to_u128(v: U512, context: &'static str) -> SdkResult<u128> {
    if v > U512::from(u128::MAX) {
        tracing::warn!("u512 overflow into u128 in {}", context);
        return Err(SdkError::MathOverflow(context));
    }
    Ok(v.as_u128())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::tick_index_to_sqrt_price_x64;

    fn sqrt(tick: i32) -> u128 {
        tick_index_to_sqrt_price_x64(tick).unwrap()
    }

    #[test]
    fn test_below_range_is_all_token_a() {
        let (lower, upper) = (sqrt(100), sqrt(200));
        let cur = sqrt(50);
        let (a, b) = coin_amounts_from_liquidity(1_000_000_000, cur, lower, upper, false).unwrap();
        assert!(a > 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn test_above_range_is_all_token_b() {
        let (lower, upper) = (sqrt(100), sqrt(200));
        let cur = sqrt(300);
        let (a, b) = coin_amounts_from_liquidity(1_000_000_000, cur, lower, upper, false).unwrap();
        assert_eq!(a, 0);
        assert!(b > 0);
    }

    #[test]
    fn test_in_range_holds_both_tokens() {
        let (lower, upper) = (sqrt(-1000), sqrt(1000));
        let cur = sqrt(0);
        let liquidity = 500_000_000_000u128;
        let (a, b) = coin_amounts_from_liquidity(liquidity, cur, lower, upper, false).unwrap();
        assert!(a > 0 && b > 0);
        // Symmetric range at price 1.0: the two sides are nearly equal.
        let (a, b) = (a as f64, b as f64);
        assert!((a - b).abs() / a < 0.01, "a={} b={}", a, b);
    }

    #[test]
    fn test_round_up_never_smaller() {
        let (lower, upper) = (sqrt(-5000), sqrt(5000));
        let cur = sqrt(137);
        let liquidity = 123_456_789_012u128;
        let (a_dn, b_dn) = coin_amounts_from_liquidity(liquidity, cur, lower, upper, false).unwrap();
        let (a_up, b_up) = coin_amounts_from_liquidity(liquidity, cur, lower, upper, true).unwrap();
        assert!(a_up >= a_dn && b_up >= b_dn);
        assert!(a_up - a_dn <= 1 && b_up - b_dn <= 1);
    }

    #[test]
    fn test_degenerate_band_rejected() {
        let p = sqrt(10);
        assert!(coin_amounts_from_liquidity(1, p, p, p, false).is_err());
    }

    #[test]
    fn test_invalid_slippage_rejected() {
        for s in [-0.01, 1.0, 1.5, f64::NAN] {
            let err = est_liquidity_and_amounts_from_one_amount(
                -100,
                100,
                1_000_000,
                true,
                true,
                s,
                sqrt(0),
            );
            assert!(matches!(err, Err(SdkError::InvalidSlippage(_))), "slippage {s}");
        }
    }

    #[test]
    fn test_fixed_token_must_be_active() {
        // Price below the range: only token A can size the deposit.
        let cur = sqrt(-500);
        let err = est_liquidity_and_amounts_from_one_amount(
            -100, 100, 1_000_000, false, true, 0.01, cur,
        );
        assert!(matches!(err, Err(SdkError::InvalidRange(_))));
        // And above it, only token B.
        let cur = sqrt(500);
        let err = est_liquidity_and_amounts_from_one_amount(
            -100, 100, 1_000_000, true, true, 0.01, cur,
        );
        assert!(matches!(err, Err(SdkError::InvalidRange(_))));
    }

    #[test]
    fn test_est_liquidity_round_trip_recovers_fixed_amount() {
        let cur = sqrt(37);
        let fixed = 5_000_000_000u128; // 5 SUI in base units
        let input = est_liquidity_and_amounts_from_one_amount(
            -443580, 443580, fixed, true, false, 0.005, cur,
        )
        .unwrap();
        assert!(input.liquidity > 0);
        // Round-down both directions: the recovered amount is within a tiny
        // relative tolerance below the fixed deposit.
        let recovered = input.amount_a as f64;
        let rel = (fixed as f64 - recovered).abs() / fixed as f64;
        assert!(rel < 1e-6, "recovered {} vs fixed {}", recovered, fixed);
        // Slippage bounds sit above the exact amounts.
        assert!(input.amount_a_max >= input.amount_a);
        assert!(input.amount_b_max >= input.amount_b);
        let inflated = input.amount_a as f64 * 1.005;
        assert!((input.amount_a_max as f64 - inflated).abs() <= 2.0);
    }

    #[test]
    fn test_zero_slippage_keeps_amounts_exact() {
        let cur = sqrt(0);
        let input = est_liquidity_and_amounts_from_one_amount(
            -1000, 1000, 1_000_000_000, true, false, 0.0, cur,
        )
        .unwrap();
        assert_eq!(input.amount_a_max, input.amount_a);
        assert_eq!(input.amount_b_max, input.amount_b);
    }
}
