// Session-owned form state for the two-step position wizard.
//
// User-entered fields are written by edit operations; derived fields (pool status,
// current price, hidden side, step validity) are written only by `apply`, with the
// outcome of a recompute pass.

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::chain::lookups::TokenMetadataSource;
use crate::engine::pipeline::{PassInputs, PassOutcome};
use crate::engine::range::validate_range;
use crate::math::units::{amount_to_f64, is_numeric_input};
use crate::models::{AmountPair, FeeTier, PoolStatus, PriceRange, Side, TokenDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub account: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(SessionHandle),
}

impl ConnectionState {
    pub fn session(&self) -> Option<SessionHandle> {
        match self {
            ConnectionState::Connected(handle) => Some(*handle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityReason {
    IncompleteFields,
    InsufficientTokens,
    NotConnected,
}

/// Validity flag for one wizard step. `reason` is `None` when valid, or when the pass
/// degraded because a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepValidity {
    pub valid: bool,
    pub reason: Option<ValidityReason>,
}

impl StepValidity {
    pub fn valid() -> Self {
        Self { valid: true, reason: None }
    }

    pub fn invalid(reason: ValidityReason) -> Self {
        Self { valid: false, reason: Some(reason) }
    }

    pub fn degraded() -> Self {
        Self { valid: false, reason: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionForm {
    pub connection: ConnectionState,
    pub token_list: Vec<TokenDescriptor>,

    pub token_a: Option<TokenDescriptor>,
    pub token_b: Option<TokenDescriptor>,
    pub fee: Option<FeeTier>,
    pub initial_price: String,
    pub min_price_input: String,
    pub max_price_input: String,
    pub range: PriceRange,
    pub amounts: AmountPair,
    /// Last amount input typed by the user; the pipeline never overwrites it.
    pub edited: Option<Side>,

    // written by recompute passes
    pub pool: PoolStatus,
    pub current_price: Option<f64>,
    pub requires_initial_price: bool,
    pub hidden: Option<Side>,
    pub step1: StepValidity,
    pub step2: StepValidity,
}

impl PositionForm {
    pub fn new() -> Self {
        Self {
            amounts: AmountPair::new("", ""),
            ..Self::default()
        }
    }

    pub fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
    }

    pub fn set_token_list(&mut self, tokens: Vec<TokenDescriptor>) {
        self.token_list = tokens;
    }

    /// Explicit load step for the selectable token list. Tokens whose metadata cannot
    /// be read are left out.
    pub async fn load_token_list<M>(&mut self, addresses: &[Address], metadata: &M) -> usize
    where
        M: TokenMetadataSource + ?Sized,
    {
        self.token_list = fetch_token_list(addresses, metadata).await;
        self.token_list.len()
    }

    pub fn select_token(&mut self, side: Side, token: Option<TokenDescriptor>) {
        match side {
            Side::A => self.token_a = token,
            Side::B => self.token_b = token,
        }
    }

    pub fn set_fee(&mut self, fee: Option<FeeTier>) {
        self.fee = fee;
    }

    /// Returns false, leaving state untouched, when `text` is not numeric.
    pub fn edit_initial_price(&mut self, text: &str) -> bool {
        if !is_numeric_input(text) {
            return false;
        }
        self.initial_price = text.to_string();
        true
    }

    pub fn initial_price_value(&self) -> f64 {
        amount_to_f64(&self.initial_price)
    }

    pub fn edit_min_price(&mut self, text: &str) -> bool {
        if !is_numeric_input(text) {
            return false;
        }
        self.min_price_input = text.to_string();
        true
    }

    pub fn edit_max_price(&mut self, text: &str) -> bool {
        if !is_numeric_input(text) {
            return false;
        }
        self.max_price_input = text.to_string();
        true
    }

    /// Commits the raw price buffers into the range if they form a valid range.
    /// On failure the buffers are restored from the committed range.
    pub fn commit_range(&mut self) -> bool {
        let min_price = amount_to_f64(&self.min_price_input);
        let max_price = amount_to_f64(&self.max_price_input);
        if validate_range(min_price, max_price) {
            self.range = PriceRange::new(min_price, max_price);
            true
        } else {
            log::debug!("Rejected range [{}, {}]", self.min_price_input, self.max_price_input);
            self.sync_price_inputs();
            false
        }
    }

    /// Programmatic range update (seeding, dragging, clamping). Keeps the buffers in sync.
    pub fn set_range(&mut self, range: PriceRange) {
        self.range = range;
        self.sync_price_inputs();
    }

    fn sync_price_inputs(&mut self) {
        self.min_price_input = format_price(self.range.min_price);
        self.max_price_input = format_price(self.range.max_price);
    }

    /// Typing into an amount input makes that side the driving one.
    pub fn edit_amount(&mut self, side: Side, text: &str) -> bool {
        if !is_numeric_input(text) {
            return false;
        }
        match side {
            Side::A => self.amounts.amount_a = text.to_string(),
            Side::B => self.amounts.amount_b = text.to_string(),
        }
        self.edited = Some(side);
        true
    }

    pub fn reveal_both_amounts(&mut self) {
        self.hidden = None;
    }

    /// Clears everything the user entered plus all derived state. The connection and
    /// the loaded token list belong to the session and survive.
    pub fn reset(&mut self) {
        let connection = self.connection;
        let token_list = std::mem::take(&mut self.token_list);
        *self = Self::new();
        self.connection = connection;
        self.token_list = token_list;
    }

    pub fn pass_inputs(&self) -> PassInputs {
        PassInputs {
            connection: self.connection,
            token_a: self.token_a.as_ref().map(|t| t.address),
            token_b: self.token_b.as_ref().map(|t| t.address),
            fee: self.fee,
            initial_price: self.initial_price_value(),
            range: self.range,
            amounts: self.amounts.clone(),
            edited: self.edited,
        }
    }

    pub fn apply(&mut self, outcome: PassOutcome) {
        self.pool = outcome.pool;
        self.current_price = outcome.current_price;
        self.requires_initial_price = outcome.requires_initial_price;
        self.hidden = outcome.hidden;
        self.step1 = outcome.step1;
        self.step2 = outcome.step2;
        if let Some(range) = outcome.range {
            self.set_range(range);
        }
        if let Some((side, amount)) = outcome.derived {
            if self.edited != Some(side) {
                match side {
                    Side::A => self.amounts.amount_a = amount,
                    Side::B => self.amounts.amount_b = amount,
                }
            }
        }
    }
}

/// Reads descriptors (label = symbol) for `addresses`, in order. Tokens whose metadata
/// cannot be read are left out.
pub async fn fetch_token_list<M>(addresses: &[Address], metadata: &M) -> Vec<TokenDescriptor>
where
    M: TokenMetadataSource + ?Sized,
{
    let lookups = addresses.iter().map(|&address| async move { (address, metadata.token_metadata(address).await) });
    let results = futures::future::join_all(lookups).await;

    let mut tokens = Vec::with_capacity(results.len());
    for (address, result) in results {
        match result {
            Ok(meta) => tokens.push(TokenDescriptor { label: meta.symbol, address }),
            Err(e) => log::warn!("Skipping token {:?}: {}", address, e),
        }
    }
    log::info!("Loaded {} of {} tokens", tokens.len(), addresses.len());
    tokens
}

fn format_price(price: f64) -> String {
    if price == 0.0 {
        String::new()
    } else {
        price.to_string()
    }
}
