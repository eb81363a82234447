// In-memory market used for offline sessions and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use ethers::types::Address;
use futures::future::{self, BoxFuture, FutureExt};
use num_bigint::BigInt;
use num_traits::Zero;

use crate::chain::lookups::{BalanceSource, PoolStateSource, TokenMetadataSource};
use crate::error::LookupError;
use crate::math::orientation::PairOrientation;
use crate::math::tick_codec::{price_to_sqrt_fixed, price_to_tick};
use crate::models::{FeeTier, PoolSnapshot, TokenMetadata};

type PoolKey = (Address, Address, u32);

fn pool_key(a: Address, b: Address, fee: FeeTier) -> PoolKey {
    if a < b { (a, b, fee.code()) } else { (b, a, fee.code()) }
}

#[derive(Default)]
pub struct MemoryChain {
    tokens: RwLock<HashMap<Address, TokenMetadata>>,
    pools: RwLock<HashMap<PoolKey, PoolSnapshot>>,
    balances: RwLock<HashMap<(Address, Address), BigInt>>,
    failing_tokens: RwLock<Vec<Address>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&self, token: Address, symbol: &str, decimals: u8) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(token, TokenMetadata { decimals, symbol: symbol.to_string() });
    }

    /// Metadata lookups for `token` fail with an rpc error from now on.
    pub fn fail_token(&self, token: Address) {
        self.failing_tokens.write().unwrap_or_else(|e| e.into_inner()).push(token);
    }

    pub fn set_pool(&self, token_a: Address, token_b: Address, fee: FeeTier, snapshot: PoolSnapshot) {
        let mut pools = self.pools.write().unwrap_or_else(|e| e.into_inner());
        pools.insert(pool_key(token_a, token_b, fee), snapshot);
    }

    /// Registers a live pool whose current human price (A per B) is `price`.
    /// Both tokens must already be registered.
    pub fn set_pool_at_price(&self, token_a: Address, token_b: Address, fee: FeeTier, price: f64, liquidity: BigInt)
        -> Result<(), LookupError>
    {
        let (dec_a, dec_b) = {
            let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
            let dec = |t: Address| tokens.get(&t).map(|m| m.decimals).ok_or_else(|| LookupError::UnknownToken(format!("{:?}", t)));
            (dec(token_a)?, dec(token_b)?)
        };
        let raw = PairOrientation::new(token_a, token_b, dec_a, dec_b).to_raw_price(price);
        let snapshot = PoolSnapshot {
            sqrt_price_x96: price_to_sqrt_fixed(raw),
            tick: price_to_tick(raw),
            liquidity,
        };
        self.set_pool(token_a, token_b, fee, snapshot);
        Ok(())
    }

    pub fn set_balance(&self, token: Address, owner: Address, raw: BigInt) {
        let mut balances = self.balances.write().unwrap_or_else(|e| e.into_inner());
        balances.insert((token, owner), raw);
    }
}

impl PoolStateSource for MemoryChain {
    fn pool_snapshot(&self, token_a: Address, token_b: Address, fee: FeeTier)
        -> BoxFuture<'_, Result<Option<PoolSnapshot>, LookupError>>
    {
        let pools = self.pools.read().unwrap_or_else(|e| e.into_inner());
        let snapshot = pools.get(&pool_key(token_a, token_b, fee)).cloned();
        future::ready(Ok(snapshot)).boxed()
    }
}

impl TokenMetadataSource for MemoryChain {
    fn token_metadata(&self, token: Address) -> BoxFuture<'_, Result<TokenMetadata, LookupError>> {
        let failing = self.failing_tokens.read().unwrap_or_else(|e| e.into_inner()).contains(&token);
        let result = if failing {
            Err(LookupError::Rpc(format!("metadata lookup failed for {:?}", token)))
        } else {
            let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
            tokens.get(&token).cloned().ok_or_else(|| LookupError::UnknownToken(format!("{:?}", token)))
        };
        future::ready(result).boxed()
    }
}

impl BalanceSource for MemoryChain {
    fn balance_of(&self, token: Address, owner: Address) -> BoxFuture<'_, Result<BigInt, LookupError>> {
        let balances = self.balances.read().unwrap_or_else(|e| e.into_inner());
        let raw = balances.get(&(token, owner)).cloned().unwrap_or_else(BigInt::zero);
        future::ready(Ok(raw)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_lookup_is_order_independent() {
        let chain = MemoryChain::new();
        let (a, b) = (Address::from([1u8; 20]), Address::from([2u8; 20]));
        chain.add_token(a, "AAA", 18);
        chain.add_token(b, "BBB", 18);
        chain.set_pool_at_price(a, b, FeeTier::Medium, 1.0, BigInt::from(1u8)).unwrap();

        assert!(chain.pool_snapshot(b, a, FeeTier::Medium).await.unwrap().is_some());
        assert!(chain.pool_snapshot(a, b, FeeTier::Low).await.unwrap().is_none());
        assert_eq!(chain.pool_snapshot(a, b, FeeTier::Medium).await.unwrap().unwrap().tick, 0);
    }

    #[test]
    fn test_unknown_balance_reads_zero() {
        let chain = MemoryChain::new();
        let (token, owner) = (Address::from([1u8; 20]), Address::from([9u8; 20]));
        assert!(tokio_test::block_on(chain.balance_of(token, owner)).unwrap().is_zero());
        chain.set_balance(token, owner, BigInt::from(42u8));
        assert_eq!(tokio_test::block_on(chain.balance_of(token, owner)).unwrap(), BigInt::from(42u8));
    }

    #[tokio::test]
    async fn test_failing_token() {
        let chain = MemoryChain::new();
        let a = Address::from([1u8; 20]);
        chain.add_token(a, "AAA", 18);
        chain.fail_token(a);
        assert!(matches!(chain.token_metadata(a).await, Err(LookupError::Rpc(_))));
    }
}
