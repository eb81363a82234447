// Range-aware amount calculator.
// -----------------------------
// Given the driving side and its amount, derives the position's amounts over a human
// price range using concentrated-liquidity math against the live pool (or a synthetic
// zero-liquidity pool anchored at the caller's price when none exists yet).
//
// The public entry never fails: every error degrades to the zero pair, which callers
// read as "cannot fund this", not as a real empty position.

use ethers::types::Address;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::chain::lookups::{PoolStateSource, TokenMetadataSource};
use crate::engine::range::validate_range;
use crate::error::{CalcError, LookupError};
use crate::math::liquidity_amounts::{amounts_for_liquidity, liquidity_from_amount0_at, liquidity_from_amount1_at};
use crate::math::orientation::PairOrientation;
use crate::math::tick_codec::{
    get_sqrt_ratio_at_tick, max_price, min_price, nearest_usable_tick, price_to_sqrt_fixed, price_to_tick, MAX_TICK,
    MIN_TICK,
};
use crate::math::units::{amount_to_f64, from_raw, snap_to_integer, to_raw};
use crate::models::{AmountPair, FeeTier, PoolSnapshot, PriceRange, Side, TokenMetadata};

/// Margin applied outside the range bounds before snapping to ticks.
pub const RANGE_EPSILON: f64 = 1e-4;
/// Raw amounts above 10^36 are treated as unrepresentable.
pub const SANITY_CEILING_EXP: u32 = 36;
/// Nominal amount used to probe which sides can fund a range.
pub const PROBE_AMOUNT: &str = "0.0001";
/// Probe results below this are treated as zero.
pub const NEGLIGIBLE_AMOUNT: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct AmountRequest {
    pub token_a: Address,
    pub token_b: Address,
    pub fee: FeeTier,
    /// The side whose amount is authoritative.
    pub direction: Side,
    pub amount: String,
    /// Human price (A per B); only used when the pool does not exist yet.
    pub current_price: f64,
    pub range: PriceRange,
    pub tick_spacing: i32,
}

impl AmountRequest {
    pub fn with_driving(&self, direction: Side, amount: &str) -> Self {
        Self { direction, amount: amount.to_string(), ..self.clone() }
    }
}

/// Pool and token state for one pair and fee, read once and shared by every calculation
/// of a recompute pass so the hidden side and the derived amount see the same price.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketView {
    orientation: PairOrientation,
    meta_a: TokenMetadata,
    meta_b: TokenMetadata,
    /// `None` when the pool has not been created yet.
    snapshot: Option<PoolSnapshot>,
}

impl MarketView {
    pub fn new(
        token_a: Address,
        token_b: Address,
        meta_a: TokenMetadata,
        meta_b: TokenMetadata,
        snapshot: Option<PoolSnapshot>,
    ) -> Self {
        let orientation = PairOrientation::new(token_a, token_b, meta_a.decimals, meta_b.decimals);
        Self { orientation, meta_a, meta_b, snapshot }
    }

    pub async fn read<L>(token_a: Address, token_b: Address, fee: FeeTier, lookups: &L) -> Result<Self, LookupError>
    where
        L: PoolStateSource + TokenMetadataSource + ?Sized,
    {
        let (snapshot, meta_a, meta_b) = futures::try_join!(
            lookups.pool_snapshot(token_a, token_b, fee),
            lookups.token_metadata(token_a),
            lookups.token_metadata(token_b),
        )?;
        Ok(Self::new(token_a, token_b, meta_a, meta_b, snapshot))
    }

    pub fn orientation(&self) -> &PairOrientation {
        &self.orientation
    }

    pub fn snapshot(&self) -> Option<&PoolSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn decimals(&self, side: Side) -> u8 {
        match side {
            Side::A => self.meta_a.decimals,
            Side::B => self.meta_b.decimals,
        }
    }

    /// Amount pair for `request`, which must be for the pair this view was read for.
    pub fn try_amounts(&self, request: &AmountRequest) -> Result<AmountPair, CalcError> {
        let range = request.range;
        if !validate_range(range.min_price, range.max_price) {
            return Err(CalcError::InvalidRange { min: range.min_price, max: range.max_price });
        }

        // 1) driving amount in raw units
        let driving_decimals = self.decimals(request.direction);
        let derived_decimals = self.decimals(request.direction.other());
        let driving_raw = to_raw(&request.amount, driving_decimals)?;
        if driving_raw.is_zero() {
            return Ok(AmountPair::zero());
        }

        // 2) pool model: live snapshot, or zero liquidity anchored at the caller's price
        let synthesized;
        let pool = match &self.snapshot {
            Some(snapshot) => snapshot,
            None => {
                synthesized = synthesize_pool(&self.orientation, request.current_price)?;
                &synthesized
            }
        };

        // 3) range ticks
        let (tick_lower, tick_upper) = range_ticks(&self.orientation, range, request.tick_spacing);

        // 4-5) liquidity from the driving side, then the position's amounts
        let sqrt_lower = get_sqrt_ratio_at_tick(tick_lower);
        let sqrt_upper = get_sqrt_ratio_at_tick(tick_upper);
        let driving_is_token0 = self.orientation.token0_side() == request.direction;
        let liquidity = if driving_is_token0 {
            liquidity_from_amount0_at(&pool.sqrt_price_x96, &sqrt_lower, &sqrt_upper, &driving_raw)
        } else {
            liquidity_from_amount1_at(&pool.sqrt_price_x96, &sqrt_lower, &sqrt_upper, &driving_raw)
        };
        let (amount0, amount1) = amounts_for_liquidity(&pool.sqrt_price_x96, &sqrt_lower, &sqrt_upper, &liquidity, true);
        let derived_out = if driving_is_token0 { amount1 } else { amount0 };
        // the driving side is echoed as typed unless it cannot fund the range at all
        let driving_out = if liquidity.is_zero() { BigInt::zero() } else { driving_raw.clone() };

        // 6) sanity ceiling
        let ceiling = BigInt::from(10u8).pow(SANITY_CEILING_EXP);
        if driving_raw > ceiling || derived_out > ceiling {
            return Err(CalcError::Overflow);
        }

        // 7) format, snapping float-like noise to integers
        let driving_text = snap_to_integer(&from_raw(&driving_out, driving_decimals));
        let derived_text = snap_to_integer(&from_raw(&derived_out, derived_decimals));
        Ok(match request.direction {
            Side::A => AmountPair::new(driving_text, derived_text),
            Side::B => AmountPair::new(derived_text, driving_text),
        })
    }

    /// Never fails; errors yield `AmountPair::zero()`.
    pub fn amounts(&self, request: &AmountRequest) -> AmountPair {
        self.try_amounts(request).unwrap_or_else(|e| {
            log::debug!("Amount calculation for {:?} side failed: {}", request.direction, e);
            AmountPair::zero()
        })
    }

    /// Probes both directions with a nominal amount and reports which amount input should
    /// be hidden: the side that cannot fund the range when only the other one can. `None`
    /// means show both (in-range, or neither probe produced anything).
    pub fn hidden_side(&self, base: &AmountRequest) -> Option<Side> {
        let from_a = self.amounts(&base.with_driving(Side::A, PROBE_AMOUNT));
        let from_b = self.amounts(&base.with_driving(Side::B, PROBE_AMOUNT));

        let yields = |pair: &AmountPair| {
            amount_to_f64(&pair.amount_a).max(amount_to_f64(&pair.amount_b)) >= NEGLIGIBLE_AMOUNT
        };
        match (yields(&from_a), yields(&from_b)) {
            (true, false) => Some(Side::B),
            (false, true) => Some(Side::A),
            _ => None,
        }
    }
}

/// Derives the amount pair for `request`. Never fails; errors yield `AmountPair::zero()`.
pub async fn compute_token_amount<L>(request: &AmountRequest, lookups: &L) -> AmountPair
where
    L: PoolStateSource + TokenMetadataSource + ?Sized,
{
    match try_compute_token_amount(request, lookups).await {
        Ok(pair) => pair,
        Err(e) => {
            log::debug!("Amount calculation for {:?} side failed: {}", request.direction, e);
            AmountPair::zero()
        }
    }
}

pub async fn try_compute_token_amount<L>(request: &AmountRequest, lookups: &L) -> Result<AmountPair, CalcError>
where
    L: PoolStateSource + TokenMetadataSource + ?Sized,
{
    let range = request.range;
    if !validate_range(range.min_price, range.max_price) {
        return Err(CalcError::InvalidRange { min: range.min_price, max: range.max_price });
    }
    let view = MarketView::read(request.token_a, request.token_b, request.fee, lookups).await?;
    view.try_amounts(request)
}

/// Reads the market once and probes it; a failed read shows both inputs.
pub async fn probe_hidden_side<L>(base: &AmountRequest, lookups: &L) -> Option<Side>
where
    L: PoolStateSource + TokenMetadataSource + ?Sized,
{
    match MarketView::read(base.token_a, base.token_b, base.fee, lookups).await {
        Ok(view) => view.hidden_side(base),
        Err(e) => {
            log::debug!("Hidden-side probe skipped: {}", e);
            None
        }
    }
}

fn synthesize_pool(orientation: &PairOrientation, human_price: f64) -> Result<PoolSnapshot, CalcError> {
    if !human_price.is_finite() || human_price <= 0.0 {
        return Err(CalcError::InvalidPrice(human_price));
    }
    let raw = orientation.to_raw_price(human_price);
    Ok(PoolSnapshot {
        sqrt_price_x96: price_to_sqrt_fixed(raw),
        tick: price_to_tick(raw),
        liquidity: BigInt::zero(),
    })
}

fn raw_price_to_usable_tick(raw: f64, spacing: i32) -> i32 {
    if raw <= min_price() {
        nearest_usable_tick(MIN_TICK, spacing)
    } else if raw >= max_price() {
        nearest_usable_tick(MAX_TICK, spacing)
    } else {
        nearest_usable_tick(price_to_tick(raw), spacing)
    }
}

/// Snaps `[min - ε, max + ε]` onto the tick grid, in pool orientation. The result always
/// spans at least one grid step.
pub fn range_ticks(orientation: &PairOrientation, range: PriceRange, spacing: i32) -> (i32, i32) {
    let spacing = spacing.max(1);
    let (raw_lower, raw_upper) = orientation.raw_bounds(range.min_price - RANGE_EPSILON, range.max_price + RANGE_EPSILON);
    let mut lower = raw_price_to_usable_tick(raw_lower, spacing);
    let mut upper = raw_price_to_usable_tick(raw_upper, spacing);
    if lower >= upper {
        let max_usable = nearest_usable_tick(MAX_TICK, spacing);
        if lower + spacing <= max_usable {
            upper = lower + spacing;
        } else {
            lower = upper - spacing;
        }
    }
    (lower, upper)
}
