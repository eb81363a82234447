use crate::models::PriceRange;

/// Lowest a min price may go, as a fraction of the current pool price.
pub const MIN_PRICE_BAND: f64 = 0.75;
/// Highest a max price may go, as a fraction of the current pool price.
pub const MAX_PRICE_BAND: f64 = 1.25;
/// Default range seeded when entering step 2.
pub const SEED_MIN_FACTOR: f64 = 0.85;
pub const SEED_MAX_FACTOR: f64 = 1.15;
/// Gap kept between the handles, as a fraction of the current span.
pub const HANDLE_BUFFER_FRACTION: f64 = 0.01;

/// A committed range is valid iff both bounds are finite, min is non-negative and min < max.
pub fn validate_range(min_price: f64, max_price: f64) -> bool {
    min_price.is_finite() && max_price.is_finite() && min_price >= 0.0 && min_price < max_price
}

/// floor(p * 0.85), ceil(p * 1.15)
pub fn seed_range(current_price: f64) -> PriceRange {
    PriceRange::new(
        (current_price * SEED_MIN_FACTOR).floor(),
        (current_price * SEED_MAX_FACTOR).ceil(),
    )
}

/// Single clamp policy shared by the drag controller and the recompute pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampPolicy {
    pub min_band: f64,
    pub max_band: f64,
    pub buffer_fraction: f64,
}

impl Default for ClampPolicy {
    fn default() -> Self {
        Self {
            min_band: MIN_PRICE_BAND,
            max_band: MAX_PRICE_BAND,
            buffer_fraction: HANDLE_BUFFER_FRACTION,
        }
    }
}

impl ClampPolicy {
    pub fn floor(&self, current_price: f64) -> f64 {
        current_price * self.min_band
    }

    pub fn ceiling(&self, current_price: f64) -> f64 {
        current_price * self.max_band
    }

    pub fn buffer(&self, range: &PriceRange) -> f64 {
        range.span() * self.buffer_fraction
    }

    /// Clamp a candidate min price: not below the floor, and `buffer` short of `max_price`.
    pub fn clamp_min(&self, candidate: f64, max_price: f64, current_price: f64, buffer: f64) -> f64 {
        candidate.max(self.floor(current_price)).min(max_price - buffer)
    }

    /// Clamp a candidate max price: not above the ceiling, and `buffer` past `min_price`.
    pub fn clamp_max(&self, candidate: f64, min_price: f64, current_price: f64, buffer: f64) -> f64 {
        candidate.min(self.ceiling(current_price)).max(min_price + buffer)
    }

    /// Re-clamps both bounds against the current price. The handle buffer is taken from the
    /// incoming span, so a range with non-zero span never ends up crossed or touching.
    pub fn clamp_range(&self, range: PriceRange, current_price: f64) -> PriceRange {
        let buffer = self.buffer(&range);
        let min_price = self.clamp_min(range.min_price, range.max_price, current_price, buffer);
        let max_price = self.clamp_max(range.max_price, min_price, current_price, buffer);
        PriceRange::new(min_price, max_price)
    }
}
