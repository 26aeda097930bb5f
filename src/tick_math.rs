// src/tick_math.rs
// Tick index <-> sqrt price (X64 fixed point) conversion for Sui CLMM pools.
// Integer-only: the per-bit magic-constant ladder matches the on-chain
// TickMath, so results are bit-exact with the protocol.

use crate::errors::{SdkError, SdkResult};
use primitive_types::U256;

/// Protocol tick domain. Chosen so sqrt(1.0001^tick) * 2^64 fits in u128.
pub const MIN_TICK: i32 = -443636;
pub const MAX_TICK: i32 = 443636;

/// sqrt price at MIN_TICK / MAX_TICK.
pub const MIN_SQRT_PRICE_X64: u128 = 4295048016;
pub const MAX_SQRT_PRICE_X64: u128 = 79226673515401279992447579055;

/// 2^64, the X64 fixed-point scale.
pub const Q64: u128 = 1 << 64;

/// sqrt(1.0001^tick) scaled by 2^64. Strictly monotonic over the domain;
/// out-of-domain ticks are an error, never clamped.
pub fn tick_index_to_sqrt_price_x64(tick: i32) -> SdkResult<u128> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(SdkError::InvalidTick(tick));
    }
    if tick >= 0 {
        Ok(sqrt_price_positive_tick(tick as u32))
    } else {
        Ok(sqrt_price_negative_tick(tick.unsigned_abs()))
    }
}

/// Largest multiple of `tick_spacing` <= `tick` (euclidean floor), clamped to
/// the initializable range inside the tick domain.
pub fn prev_initializable_tick(tick: i32, tick_spacing: u32) -> SdkResult<i32> {
    let spacing = checked_spacing(tick, tick_spacing)?;
    let floored = tick.div_euclid(spacing) * spacing;
    Ok(clamp_initializable(floored, spacing))
}

/// Smallest multiple of `tick_spacing` >= `tick` (euclidean ceil), clamped to
/// the initializable range inside the tick domain.
pub fn next_initializable_tick(tick: i32, tick_spacing: u32) -> SdkResult<i32> {
    let spacing = checked_spacing(tick, tick_spacing)?;
    let rem = tick.rem_euclid(spacing);
    let ceiled = tick.div_euclid(spacing) * spacing + if rem != 0 { spacing } else { 0 };
    Ok(clamp_initializable(ceiled, spacing))
}

fn checked_spacing(tick: i32, tick_spacing: u32) -> SdkResult<i32> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(SdkError::InvalidTick(tick));
    }
    if tick_spacing == 0 || tick_spacing as i64 > MAX_TICK as i64 {
        return Err(SdkError::InvalidRange(format!(
            "tick spacing {} out of range",
            tick_spacing
        )));
    }
    Ok(tick_spacing as i32)
}

fn clamp_initializable(tick: i32, spacing: i32) -> i32 {
    // Smallest/largest initializable ticks inside the domain.
    let min_init = MIN_TICK.div_euclid(spacing) * spacing
        + if MIN_TICK.rem_euclid(spacing) != 0 { spacing } else { 0 };
    let max_init = MAX_TICK.div_euclid(spacing) * spacing;
    tick.clamp(min_init, max_init)
}

// (r * c) >> 64 for the negative-tick ladder. Both operands stay below 2^64
// (ratio only shrinks), so the product fits u128.
fn mul_shift_64(r: u128, c: u128) -> u128 {
    (r * c) >> 64
}

// (r * c) >> 96 for the positive-tick ladder; intermediates need 256 bits.
fn mul_shift_96(r: u128, c: u128) -> u128 {
    ((U256::from(r) * U256::from(c)) >> 96).as_u128()
}

fn sqrt_price_negative_tick(abs_tick: u32) -> u128 {
    let mut ratio: u128 = if abs_tick & 1 != 0 {
        18445821805675392311
    } else {
        18446744073709551616
    };
    if abs_tick & 2 != 0 {
        ratio = mul_shift_64(ratio, 18444899583751176498);
    }
    if abs_tick & 4 != 0 {
        ratio = mul_shift_64(ratio, 18443055278223354162);
    }
    if abs_tick & 8 != 0 {
        ratio = mul_shift_64(ratio, 18439367220385604838);
    }
    if abs_tick & 16 != 0 {
        ratio = mul_shift_64(ratio, 18431993317065449817);
    }
    if abs_tick & 32 != 0 {
        ratio = mul_shift_64(ratio, 18417254355718160513);
    }
    if abs_tick & 64 != 0 {
        ratio = mul_shift_64(ratio, 18387811781193591352);
    }
    if abs_tick & 128 != 0 {
        ratio = mul_shift_64(ratio, 18329067761203520168);
    }
    if abs_tick & 256 != 0 {
        ratio = mul_shift_64(ratio, 18212142134806087854);
    }
    if abs_tick & 512 != 0 {
        ratio = mul_shift_64(ratio, 17980523815641551639);
    }
    if abs_tick & 1024 != 0 {
        ratio = mul_shift_64(ratio, 17526086738831147013);
    }
    if abs_tick & 2048 != 0 {
        ratio = mul_shift_64(ratio, 16651378430235024244);
    }
    if abs_tick & 4096 != 0 {
        ratio = mul_shift_64(ratio, 15030750278693429944);
    }
    if abs_tick & 8192 != 0 {
        ratio = mul_shift_64(ratio, 12247334978882834399);
    }
    if abs_tick & 16384 != 0 {
        ratio = mul_shift_64(ratio, 8131365268884726200);
    }
    if abs_tick & 32768 != 0 {
        ratio = mul_shift_64(ratio, 3584323654723342297);
    }
    if abs_tick & 65536 != 0 {
        ratio = mul_shift_64(ratio, 696457651847595233);
    }
    if abs_tick & 131072 != 0 {
        ratio = mul_shift_64(ratio, 26294789957452057);
    }
    if abs_tick & 262144 != 0 {
        ratio = mul_shift_64(ratio, 37481735321082);
    }
    ratio
}

fn sqrt_price_positive_tick(abs_tick: u32) -> u128 {
    // Computed in X96 and shifted down to X64 at the end, as the reference
    // protocol does.
    let mut ratio: u128 = if abs_tick & 1 != 0 {
        79232123823359799118286999567
    } else {
        79228162514264337593543950336
    };
    if abs_tick & 2 != 0 {
        ratio = mul_shift_96(ratio, 79236085330515764027303304731);
    }
    if abs_tick & 4 != 0 {
        ratio = mul_shift_96(ratio, 79244008939048815603706035061);
    }
    if abs_tick & 8 != 0 {
        ratio = mul_shift_96(ratio, 79259858533276714757314932305);
    }
    if abs_tick & 16 != 0 {
        ratio = mul_shift_96(ratio, 79291567232598584799939703904);
    }
    if abs_tick & 32 != 0 {
        ratio = mul_shift_96(ratio, 79355022692464371645785046466);
    }
    if abs_tick & 64 != 0 {
        ratio = mul_shift_96(ratio, 79482085999252804386437311141);
    }
    if abs_tick & 128 != 0 {
        ratio = mul_shift_96(ratio, 79736823300114093921829183326);
    }
    if abs_tick & 256 != 0 {
        ratio = mul_shift_96(ratio, 80248749790819932309965073892);
    }
    if abs_tick & 512 != 0 {
        ratio = mul_shift_96(ratio, 81282483887344747381513967011);
    }
    if abs_tick & 1024 != 0 {
        ratio = mul_shift_96(ratio, 83390072131320151908154831281);
    }
    if abs_tick & 2048 != 0 {
        ratio = mul_shift_96(ratio, 87770609709833776024991924138);
    }
    if abs_tick & 4096 != 0 {
        ratio = mul_shift_96(ratio, 97234110755111693312479820773);
    }
    if abs_tick & 8192 != 0 {
        ratio = mul_shift_96(ratio, 119332217159966728226237229890);
    }
    if abs_tick & 16384 != 0 {
        ratio = mul_shift_96(ratio, 179736315981702064433883588727);
    }
    if abs_tick & 32768 != 0 {
        ratio = mul_shift_96(ratio, 407748233172238350107850275304);
    }
    if abs_tick & 65536 != 0 {
        ratio = mul_shift_96(ratio, 2098478828474011932436660412517);
    }
    if abs_tick & 131072 != 0 {
        ratio = mul_shift_96(ratio, 55581415166113811149459800483533);
    }
    if abs_tick & 262144 != 0 {
        ratio = mul_shift_96(ratio, 38992368544603139932233054999993551);
    }
    ratio >> 32
}
