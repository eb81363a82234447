// Debounced recompute pipeline.
// -----------------------------
// Every change to the form reschedules a single pass. A pass snapshots the form inputs,
// re-derives pool status, clamped range, hidden side, the derived amount and both step
// validity flags, then writes them back unless a newer pass was scheduled meanwhile.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ethers::types::Address;
use log::{debug, warn};
use num_traits::Signed;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::chain::lookups::MarketLookups;
use crate::config::EngineConfig;
use crate::engine::amount_calculator::{AmountRequest, MarketView};
use crate::engine::form::{ConnectionState, PositionForm, StepValidity, ValidityReason};
use crate::engine::range::validate_range;
use crate::math::units::to_raw;
use crate::models::{AmountPair, FeeTier, PoolStatus, PriceRange, Side};

/// Snapshot of the user-entered form fields a pass depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct PassInputs {
    pub connection: ConnectionState,
    pub token_a: Option<Address>,
    pub token_b: Option<Address>,
    pub fee: Option<FeeTier>,
    pub initial_price: f64,
    pub range: PriceRange,
    pub amounts: AmountPair,
    pub edited: Option<Side>,
}

impl PassInputs {
    /// Both tokens and the fee, when step 1 names two different tokens.
    pub fn selected_pair(&self) -> Option<(Address, Address, FeeTier)> {
        match (self.token_a, self.token_b, self.fee) {
            (Some(a), Some(b), Some(fee)) if a != b => Some((a, b, fee)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PassOutcome {
    pub pool: PoolStatus,
    /// Human price (A per B): the live pool price, or the initial price when no pool exists.
    pub current_price: Option<f64>,
    pub requires_initial_price: bool,
    /// Set only when clamping moved a bound.
    pub range: Option<PriceRange>,
    pub hidden: Option<Side>,
    /// Recomputed non-edited amount.
    pub derived: Option<(Side, String)>,
    pub step1: StepValidity,
    pub step2: StepValidity,
}

impl PassOutcome {
    fn blocked(reason: ValidityReason) -> Self {
        Self {
            step1: StepValidity::invalid(reason),
            step2: StepValidity::invalid(reason),
            ..Self::default()
        }
    }

    fn degraded(pool: PoolStatus) -> Self {
        Self {
            pool,
            step1: StepValidity::degraded(),
            step2: StepValidity::degraded(),
            ..Self::default()
        }
    }
}

/// One recompute pass. Never fails: lookup failures degrade to invalid steps.
pub async fn run_pass<L>(inputs: &PassInputs, lookups: &L, config: &EngineConfig) -> PassOutcome
where
    L: MarketLookups + ?Sized,
{
    // 0) connection precondition
    let ConnectionState::Connected(session) = inputs.connection else {
        return PassOutcome::blocked(ValidityReason::NotConnected);
    };

    // 1) step-1 completeness
    let Some((token_a, token_b, fee)) = inputs.selected_pair() else {
        return PassOutcome::blocked(ValidityReason::IncompleteFields);
    };

    // 2) pool status and current price, read once for the whole pass
    let (snapshot, meta) = futures::join!(
        lookups.pool_snapshot(token_a, token_b, fee),
        async { futures::try_join!(lookups.token_metadata(token_a), lookups.token_metadata(token_b)) },
    );
    let snapshot = match snapshot {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Pool lookup failed: {}", e);
            return PassOutcome::degraded(PoolStatus::Unknown);
        }
    };
    let (meta_a, meta_b) = match meta {
        Ok(meta) => meta,
        Err(e) => {
            warn!("Token metadata lookup failed: {}", e);
            return PassOutcome::degraded(snapshot.map(PoolStatus::Live).unwrap_or(PoolStatus::NotCreated));
        }
    };
    let view = MarketView::new(token_a, token_b, meta_a, meta_b, snapshot.clone());

    let mut outcome = PassOutcome::default();
    match snapshot {
        Some(snapshot) => {
            let price = view.orientation().to_human_price(snapshot.raw_price());
            outcome.current_price = Some(price).filter(|p| p.is_finite() && *p > 0.0);
            outcome.pool = PoolStatus::Live(snapshot);
        }
        None => {
            outcome.pool = PoolStatus::NotCreated;
            outcome.requires_initial_price = true;
            outcome.current_price = Some(inputs.initial_price).filter(|p| p.is_finite() && *p > 0.0);
        }
    }
    outcome.step1 = if outcome.requires_initial_price && outcome.current_price.is_none() {
        StepValidity::invalid(ValidityReason::IncompleteFields)
    } else {
        StepValidity::valid()
    };

    let Some(current_price) = outcome.current_price else {
        outcome.step2 = StepValidity::invalid(ValidityReason::IncompleteFields);
        return outcome;
    };
    if !validate_range(inputs.range.min_price, inputs.range.max_price) {
        outcome.step2 = StepValidity::invalid(ValidityReason::IncompleteFields);
        return outcome;
    }

    // 3) clamp against the current price
    let range = config.clamp.clamp_range(inputs.range, current_price);
    if range != inputs.range {
        debug!("Clamped range {:?} -> {:?} at price {}", inputs.range, range, current_price);
        outcome.range = Some(range);
    }

    // 4) hidden side
    let base = AmountRequest {
        token_a,
        token_b,
        fee,
        direction: Side::A,
        amount: String::new(),
        current_price,
        range,
        tick_spacing: config.tick_spacing,
    };
    outcome.hidden = view.hidden_side(&base);

    // 5) derived amount
    let mut amounts = inputs.amounts.clone();
    if let Some(edited) = inputs.edited.filter(|side| outcome.hidden != Some(*side)) {
        let request = base.with_driving(edited, amounts.get(edited));
        let pair = view.amounts(&request);
        let derived_side = edited.other();
        let derived = pair.get(derived_side).to_string();
        match derived_side {
            Side::A => amounts.amount_a = derived.clone(),
            Side::B => amounts.amount_b = derived.clone(),
        }
        outcome.derived = Some((derived_side, derived));
    }

    // 6) step-2 completeness in raw units, then balances
    let mut required = Vec::with_capacity(2);
    for side in [Side::A, Side::B].into_iter().filter(|side| outcome.hidden != Some(*side)) {
        match to_raw(amounts.get(side), view.decimals(side)) {
            Ok(raw) if raw.is_positive() => required.push((side, raw)),
            Ok(_) => {
                debug!("{:?} amount {:?} is below one raw unit", side, amounts.get(side));
                outcome.step2 = StepValidity::invalid(ValidityReason::IncompleteFields);
                return outcome;
            }
            Err(e) => {
                debug!("Unparseable {:?} amount: {}", side, e);
                outcome.step2 = StepValidity::invalid(ValidityReason::IncompleteFields);
                return outcome;
            }
        }
    }

    for (side, required) in required {
        let token = match side {
            Side::A => token_a,
            Side::B => token_b,
        };
        match lookups.balance_of(token, session.account).await {
            Ok(balance) if balance >= required => {}
            Ok(balance) => {
                debug!("Insufficient {:?} balance: have {}, need {}", side, balance, required);
                outcome.step2 = StepValidity::invalid(ValidityReason::InsufficientTokens);
                return outcome;
            }
            Err(e) => {
                warn!("Balance lookup failed for {:?}: {}", token, e);
                outcome.step2 = StepValidity::degraded();
                return outcome;
            }
        }
    }

    outcome.step2 = StepValidity::valid();
    outcome
}

/// Owns the single debounce timer of a form. Dropping the pipeline cancels any pending pass.
pub struct RecomputePipeline<L: ?Sized> {
    form: Arc<Mutex<PositionForm>>,
    lookups: Arc<L>,
    config: EngineConfig,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl<L> RecomputePipeline<L>
where
    L: MarketLookups + ?Sized + 'static,
{
    pub fn new(form: Arc<Mutex<PositionForm>>, lookups: Arc<L>, config: EngineConfig) -> Self {
        Self {
            form,
            lookups,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn form(&self) -> &Arc<Mutex<PositionForm>> {
        &self.form
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True while a scheduled pass has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Cancel-and-reschedule: the pending pass (timer or in flight) is dropped and a new
    /// one fires after the debounce delay.
    pub fn schedule(&mut self) {
        self.cancel_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let form = self.form.clone();
        let lookups = self.lookups.clone();
        let config = self.config.clone();
        let current = self.generation.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(config.debounce).await;
            execute(&form, lookups.as_ref(), &config, &current, generation).await;
        }));
    }

    /// Runs a pass immediately, superseding anything scheduled.
    pub async fn flush(&mut self) {
        self.cancel_pending();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        execute(&self.form, self.lookups.as_ref(), &self.config, &self.generation, generation).await;
    }

    /// Mutates the form, then reschedules.
    pub async fn update<F, R>(&mut self, edit: F) -> R
    where
        F: FnOnce(&mut PositionForm) -> R,
    {
        let result = {
            let mut form = self.form.lock().await;
            edit(&mut form)
        };
        self.schedule();
        result
    }

    /// Stops the timer; no pass scheduled so far will write to the form.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl<L: ?Sized> Drop for RecomputePipeline<L> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

async fn execute<L>(form: &Mutex<PositionForm>, lookups: &L, config: &EngineConfig, current: &AtomicU64, generation: u64)
where
    L: MarketLookups + ?Sized,
{
    let inputs = form.lock().await.pass_inputs();
    let outcome = run_pass(&inputs, lookups, config).await;

    let mut form = form.lock().await;
    if current.load(Ordering::SeqCst) != generation {
        debug!("Discarding superseded pass {}", generation);
        return;
    }
    debug!("Applying pass {}: step1={:?} step2={:?} hidden={:?}", generation, outcome.step1, outcome.step2, outcome.hidden);
    form.apply(outcome);
}
