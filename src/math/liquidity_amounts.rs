// Concentrated-liquidity amount math on Q64.96 sqrt prices.
// ----------------------------------------------------------
// BigInt end-to-end so wide ranges and 18-decimal tokens never overflow.
//
// Regions, with sa < sb the range bounds and sp the current sqrt price:
//   sp <= sa       : position is entirely token0
//   sa < sp < sb   : both tokens
//   sp >= sb       : position is entirely token1

use num_bigint::BigInt;
use num_traits::{One, Zero};

#[inline]
fn ceil_div(a: &BigInt, b: &BigInt) -> BigInt {
    // assumes a>=0, b>0
    if a.is_zero() {
        return BigInt::zero();
    }
    (a + (b - BigInt::one())) / b
}

#[inline]
fn ordered(a: &BigInt, b: &BigInt) -> (BigInt, BigInt) {
    if a < b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[inline]
fn q96() -> BigInt {
    BigInt::one() << 96
}

// --------------------------- SqrtPriceMath deltas ---------------------------

/// amount0 = L * 2^96 * (sb - sa) / sb / sa, with Uniswap's two-step rounding.
pub fn amount0_delta(sqrt_ratio_a_x96: &BigInt, sqrt_ratio_b_x96: &BigInt, liquidity: &BigInt, round_up: bool) -> BigInt {
    if liquidity.is_zero() {
        return BigInt::zero();
    }
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sa.is_zero() || sa == sb {
        return BigInt::zero();
    }

    let numerator1 = liquidity << 96;
    let numerator2 = &sb - &sa;

    if round_up {
        let t = ceil_div(&(&numerator1 * &numerator2), &sb);
        ceil_div(&t, &sa)
    } else {
        ((&numerator1 * &numerator2) / &sb) / &sa
    }
}

/// amount1 = L * (sb - sa) / 2^96
pub fn amount1_delta(sqrt_ratio_a_x96: &BigInt, sqrt_ratio_b_x96: &BigInt, liquidity: &BigInt, round_up: bool) -> BigInt {
    if liquidity.is_zero() {
        return BigInt::zero();
    }
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if sa == sb {
        return BigInt::zero();
    }

    let num = liquidity * (sb - sa);
    if round_up {
        ceil_div(&num, &q96())
    } else {
        num / q96()
    }
}

// ---------------------------- Liquidity from amounts ----------------------------

/// L = amount0 * sa * sb / ((sb - sa) * 2^96)
pub fn liquidity_for_amount0(sqrt_ratio_a_x96: &BigInt, sqrt_ratio_b_x96: &BigInt, amount0: &BigInt) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let denom = (&sb - &sa) * q96();
    if denom.is_zero() {
        return BigInt::zero();
    }
    (amount0 * &sa * &sb) / denom
}

/// L = amount1 * 2^96 / (sb - sa)
pub fn liquidity_for_amount1(sqrt_ratio_a_x96: &BigInt, sqrt_ratio_b_x96: &BigInt, amount1: &BigInt) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let delta = &sb - &sa;
    if delta.is_zero() {
        return BigInt::zero();
    }
    (amount1 << 96) / delta
}

/// Liquidity a position over [sa, sb] gets from `amount0` alone at the current price.
/// Zero when the range is entirely below the current price (token0 cannot fund it).
pub fn liquidity_from_amount0_at(sqrt_price_x96: &BigInt, sqrt_ratio_a_x96: &BigInt, sqrt_ratio_b_x96: &BigInt, amount0: &BigInt) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if *sqrt_price_x96 <= sa {
        liquidity_for_amount0(&sa, &sb, amount0)
    } else if *sqrt_price_x96 < sb {
        liquidity_for_amount0(sqrt_price_x96, &sb, amount0)
    } else {
        BigInt::zero()
    }
}

/// Liquidity a position over [sa, sb] gets from `amount1` alone at the current price.
/// Zero when the range is entirely above the current price (token1 cannot fund it).
pub fn liquidity_from_amount1_at(sqrt_price_x96: &BigInt, sqrt_ratio_a_x96: &BigInt, sqrt_ratio_b_x96: &BigInt, amount1: &BigInt) -> BigInt {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if *sqrt_price_x96 >= sb {
        liquidity_for_amount1(&sa, &sb, amount1)
    } else if *sqrt_price_x96 > sa {
        liquidity_for_amount1(&sa, sqrt_price_x96, amount1)
    } else {
        BigInt::zero()
    }
}

/// (amount0, amount1) held by `liquidity` over [sa, sb] at the current price.
pub fn amounts_for_liquidity(
    sqrt_price_x96: &BigInt,
    sqrt_ratio_a_x96: &BigInt,
    sqrt_ratio_b_x96: &BigInt,
    liquidity: &BigInt,
    round_up: bool,
) -> (BigInt, BigInt) {
    let (sa, sb) = ordered(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if *sqrt_price_x96 <= sa {
        (amount0_delta(&sa, &sb, liquidity, round_up), BigInt::zero())
    } else if *sqrt_price_x96 < sb {
        (
            amount0_delta(sqrt_price_x96, &sb, liquidity, round_up),
            amount1_delta(&sa, sqrt_price_x96, liquidity, round_up),
        )
    } else {
        (BigInt::zero(), amount1_delta(&sa, &sb, liquidity, round_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick_codec::get_sqrt_ratio_at_tick;
    use num_traits::ToPrimitive;

    fn e18(v: u64) -> BigInt {
        BigInt::from(v) * BigInt::from(10u64).pow(18)
    }

    #[test]
    fn test_amount1_delta_rounding() {
        let sa = q96();
        let sb = &sa + BigInt::from(1u8);
        let l = BigInt::from(1u8);
        assert_eq!(amount1_delta(&sa, &sb, &l, false), BigInt::zero());
        assert_eq!(amount1_delta(&sa, &sb, &l, true), BigInt::one());
    }

    #[test]
    fn test_zero_liquidity_gives_zero_amounts() {
        let sa = get_sqrt_ratio_at_tick(-600);
        let sb = get_sqrt_ratio_at_tick(600);
        let sp = get_sqrt_ratio_at_tick(0);
        let (a0, a1) = amounts_for_liquidity(&sp, &sa, &sb, &BigInt::zero(), true);
        assert!(a0.is_zero() && a1.is_zero());
    }

    #[test]
    fn test_single_sided_regions() {
        let sa = get_sqrt_ratio_at_tick(600);
        let sb = get_sqrt_ratio_at_tick(1200);
        let below = get_sqrt_ratio_at_tick(0);
        let above = get_sqrt_ratio_at_tick(1800);

        // price below the range: only token0 can fund it
        assert!(liquidity_from_amount0_at(&below, &sa, &sb, &e18(1)) > BigInt::zero());
        assert!(liquidity_from_amount1_at(&below, &sa, &sb, &e18(1)).is_zero());

        // price above the range: only token1 can fund it
        assert!(liquidity_from_amount0_at(&above, &sa, &sb, &e18(1)).is_zero());
        assert!(liquidity_from_amount1_at(&above, &sa, &sb, &e18(1)) > BigInt::zero());
    }

    #[test]
    fn test_in_range_amount0_roundtrip() {
        let sa = get_sqrt_ratio_at_tick(-1200);
        let sb = get_sqrt_ratio_at_tick(1200);
        let sp = get_sqrt_ratio_at_tick(0);
        let amount0 = e18(10);

        let l = liquidity_from_amount0_at(&sp, &sa, &sb, &amount0);
        let (a0, a1) = amounts_for_liquidity(&sp, &sa, &sb, &l, true);

        let diff = (&a0 - &amount0).to_f64().unwrap_or(f64::MAX).abs();
        assert!(diff <= 2.0, "amount0 drifted by {}", diff);
        // symmetric range around price 1: roughly equal token1
        let ratio = a1.to_f64().unwrap_or(0.0) / amount0.to_f64().unwrap_or(1.0);
        assert!(ratio > 0.99 && ratio < 1.01, "ratio {}", ratio);
    }
}
