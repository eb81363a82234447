// Tick <-> price codec over the Q64.96 sqrt-price representation.
// ----------------------------------------------------------------
// Notes:
// - "Raw" prices here are token1 per token0 in smallest units. Decimal and orientation
//   adjustments for human prices live in the amount calculator.
// - Prices enter as f64 and are scaled to 18 decimals before any integer math, so the
//   only rounding before the final cast is the 1e-18 quantisation.
// - Ticks are clamped to [MIN_TICK, MAX_TICK] everywhere; nothing here panics.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// getSqrtRatioAtTick(MIN_TICK)
pub const MIN_SQRT_RATIO: u128 = 4_295_128_739;
/// getSqrtRatioAtTick(MAX_TICK), does not fit in u128.
pub const MAX_SQRT_RATIO_DEC: &str = "1461446703485210103287273052203988822378723970342";

const PRICE_SCALE_DECIMALS: u32 = 18;
const Q96_F64: f64 = 79_228_162_514_264_337_593_543_950_336.0;

// Q128.128 multipliers for each bit of |tick|, from 0x2 up to 0x80000.
const TICK_BIT_FACTORS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

pub fn min_sqrt_ratio() -> BigInt {
    BigInt::from(MIN_SQRT_RATIO)
}

pub fn max_sqrt_ratio() -> BigInt {
    // constant literal, always parses
    BigInt::parse_bytes(MAX_SQRT_RATIO_DEC.as_bytes(), 10).unwrap_or_else(|| get_sqrt_ratio_at_tick(MAX_TICK))
}

/// Smallest representable raw price (price at MIN_TICK).
pub fn min_price() -> f64 {
    tick_to_price(MIN_TICK)
}

/// Largest representable raw price (price at MAX_TICK).
pub fn max_price() -> f64 {
    tick_to_price(MAX_TICK)
}

// -------------------------------- Tick Math --------------------------------

/// TickMath.getSqrtRatioAtTick as an exact Q64.96 integer. Out-of-range ticks are clamped.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> BigInt {
    let tick = tick.clamp(MIN_TICK, MAX_TICK);
    let abs_tick = tick.unsigned_abs();

    // ratio is Q128.128
    let mut ratio = if abs_tick & 0x1 != 0 {
        BigInt::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        BigInt::one() << 128
    };

    for (bit, factor) in TICK_BIT_FACTORS {
        if abs_tick & bit != 0 {
            ratio = (&ratio * BigInt::from(factor)) >> 128;
        }
    }

    if tick > 0 {
        let max = (BigInt::one() << 256) - 1;
        ratio = max / ratio;
    }
    // round-up shift by 32 (Q128.128 -> Q64.96)
    (&ratio + ((BigInt::one() << 32) - 1)) >> 32
}

/// Greatest tick whose sqrt ratio is <= `sqrt_price_x96`. Inputs outside the
/// representable ratio range resolve to the nearest bound.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: &BigInt) -> i32 {
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        let mid = lo + ((hi - lo + 1) / 2);
        if get_sqrt_ratio_at_tick(mid) <= *sqrt_price_x96 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

// ------------------------------ Price <-> sqrt ------------------------------

/// sqrt(price) * 2^96, computed as isqrt(price_x18 * 2^192 / 10^18).
/// Non-positive or non-finite prices encode to zero.
pub fn price_to_sqrt_fixed(price: f64) -> BigInt {
    if !price.is_finite() || price <= 0.0 {
        return BigInt::zero();
    }
    let scale = BigInt::from(10u8).pow(PRICE_SCALE_DECIMALS);
    let price_x18 = match BigInt::from_f64((price * 1e18).round()) {
        Some(v) if v.is_positive() => v,
        _ => return BigInt::zero(),
    };
    let ratio_x192 = (price_x18 << 192usize) / scale;
    ratio_x192.sqrt()
}

/// (sqrt_fixed / 2^96)^2
pub fn sqrt_fixed_to_price(sqrt_fixed: &BigInt) -> f64 {
    let s = sqrt_fixed.to_f64().unwrap_or(0.0) / Q96_F64;
    s * s
}

/// Tick whose boundary sqrt ratio is the closest one at or below sqrt(price).
pub fn price_to_tick(price: f64) -> i32 {
    let sqrt = price_to_sqrt_fixed(price);
    let min = min_sqrt_ratio();
    if sqrt <= min {
        return MIN_TICK;
    }
    let max = max_sqrt_ratio();
    if sqrt >= max {
        return MAX_TICK;
    }
    get_tick_at_sqrt_ratio(&sqrt)
}

/// sqrtRatio(tick)^2 / 2^192
pub fn tick_to_price(tick: i32) -> f64 {
    let sqrt = get_sqrt_ratio_at_tick(tick);
    let ratio_x192 = &sqrt * &sqrt;
    let q192 = (BigInt::one() << 192usize).to_f64().unwrap_or(f64::INFINITY);
    ratio_x192.to_f64().unwrap_or(f64::INFINITY) / q192
}

/// Rounds `tick` to the nearest multiple of `spacing` that lies inside [MIN_TICK, MAX_TICK].
pub fn nearest_usable_tick(tick: i32, spacing: i32) -> i32 {
    let spacing = spacing.max(1);
    let tick = tick.clamp(MIN_TICK, MAX_TICK);
    let rounded = (tick as f64 / spacing as f64).round() as i32 * spacing;
    if rounded < MIN_TICK {
        rounded + spacing
    } else if rounded > MAX_TICK {
        rounded - spacing
    } else {
        rounded
    }
}
