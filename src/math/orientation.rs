// Human prices are quoted as token A per token B. Pools price token1 per token0 in
// raw units, with token0 the lower address. This maps between the two.

use ethers::types::Address;

use crate::models::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairOrientation {
    pub a_is_token0: bool,
    pub decimals_a: u8,
    pub decimals_b: u8,
}

impl PairOrientation {
    pub fn new(token_a: Address, token_b: Address, decimals_a: u8, decimals_b: u8) -> Self {
        Self { a_is_token0: token_a < token_b, decimals_a, decimals_b }
    }

    /// Which user-facing side is the pool's token0.
    pub fn token0_side(&self) -> Side {
        if self.a_is_token0 { Side::A } else { Side::B }
    }

    #[inline]
    fn decimal_shift(&self) -> f64 {
        10f64.powi(self.decimals_a as i32 - self.decimals_b as i32)
    }

    /// Human price (A per B) -> raw pool price (token1 per token0).
    /// Non-positive human prices map to 0 or +inf depending on orientation.
    pub fn to_raw_price(&self, human: f64) -> f64 {
        if self.a_is_token0 {
            // token1 = B: raw = (1 / P) * 10^(decB - decA)
            if human <= 0.0 { f64::INFINITY } else { 1.0 / (human * self.decimal_shift()) }
        } else {
            // token1 = A: raw = P * 10^(decA - decB)
            if human <= 0.0 { 0.0 } else { human * self.decimal_shift() }
        }
    }

    /// Raw pool price (token1 per token0) -> human price (A per B).
    pub fn to_human_price(&self, raw: f64) -> f64 {
        if raw <= 0.0 {
            return if self.a_is_token0 { f64::INFINITY } else { 0.0 };
        }
        if self.a_is_token0 {
            1.0 / (raw * self.decimal_shift())
        } else {
            raw / self.decimal_shift()
        }
    }

    /// Raw price bounds (lower, upper) for a human range, in ascending raw order.
    pub fn raw_bounds(&self, human_min: f64, human_max: f64) -> (f64, f64) {
        let a = self.to_raw_price(human_min);
        let b = self.to_raw_price(human_max);
        if a <= b { (a, b) } else { (b, a) }
    }
}
