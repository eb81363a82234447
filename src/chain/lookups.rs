// Collaborator seams consumed by the engine. Implementations: the ethers reader in
// `uniswap_v3_client` and the in-memory `MemoryChain`.

use ethers::types::Address;
use futures::future::BoxFuture;
use num_bigint::BigInt;

use crate::error::LookupError;
use crate::models::{FeeTier, PoolSnapshot, TokenMetadata};

pub trait PoolStateSource: Send + Sync {
    /// `Ok(None)` when no pool exists for the pair and fee.
    fn pool_snapshot(&self, token_a: Address, token_b: Address, fee: FeeTier)
        -> BoxFuture<'_, Result<Option<PoolSnapshot>, LookupError>>;
}

pub trait TokenMetadataSource: Send + Sync {
    fn token_metadata(&self, token: Address) -> BoxFuture<'_, Result<TokenMetadata, LookupError>>;
}

pub trait BalanceSource: Send + Sync {
    /// Raw balance of `owner` in smallest units.
    fn balance_of(&self, token: Address, owner: Address) -> BoxFuture<'_, Result<BigInt, LookupError>>;
}

/// Everything the calculator and pipeline read from the outside world.
pub trait MarketLookups: PoolStateSource + TokenMetadataSource + BalanceSource {}

impl<T: PoolStateSource + TokenMetadataSource + BalanceSource> MarketLookups for T {}
