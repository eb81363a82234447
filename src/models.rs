use ethers::types::Address;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::math::tick_codec::sqrt_fixed_to_price;

/// A selectable token. Two descriptors are the same token iff their addresses match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub label: String,
    pub address: Address,
}

impl PartialEq for TokenDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for TokenDescriptor {}

/// Pool fee tiers. `code()` is the integer fee code used on-chain (hundredths of a basis point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeTier {
    Lowest, // 0.01%
    Low,    // 0.05%
    Medium, // 0.30%
    High,   // 1.00%
}

impl FeeTier {
    pub const ALL: [FeeTier; 4] = [FeeTier::Lowest, FeeTier::Low, FeeTier::Medium, FeeTier::High];

    pub fn code(self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10_000,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.code() == code)
    }
}

/// Human price range, quoted as token A per token B.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceRange {
    pub min_price: f64,
    pub max_price: f64,
}

impl PriceRange {
    pub fn new(min_price: f64, max_price: f64) -> Self {
        Self { min_price, max_price }
    }

    pub fn span(&self) -> f64 {
        (self.max_price - self.min_price).abs()
    }
}

/// Live pool state as read from the pool-state collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub sqrt_price_x96: BigInt,
    pub tick: i32,
    pub liquidity: BigInt,
}

impl PoolSnapshot {
    /// token1 per token0 in raw units.
    pub fn raw_price(&self) -> f64 {
        sqrt_fixed_to_price(&self.sqrt_price_x96)
    }
}

/// What the session knows about the pool for the selected pair and fee.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PoolStatus {
    #[default]
    Unknown,
    Live(PoolSnapshot),
    NotCreated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: String,
}

/// The two sides of a position, as decimal strings in token units.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmountPair {
    pub amount_a: String,
    pub amount_b: String,
}

impl AmountPair {
    pub fn new(amount_a: impl Into<String>, amount_b: impl Into<String>) -> Self {
        Self { amount_a: amount_a.into(), amount_b: amount_b.into() }
    }

    pub fn zero() -> Self {
        Self::new("0", "0")
    }

    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::A => &self.amount_a,
            Side::B => &self.amount_b,
        }
    }
}

/// One of the two amount inputs. Also used as the driving direction of the calculator
/// and as the edited-field marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" => Ok(Side::A),
            "b" => Ok(Side::B),
            other => Err(format!("unknown side {:?}", other)),
        }
    }
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}
