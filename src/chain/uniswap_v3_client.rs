use anyhow::{Context, Result};
use ethers::contract::abigen;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use futures::future::{BoxFuture, FutureExt};
use num_bigint::{BigInt, Sign};
use std::sync::Arc;

use crate::chain::lookups::{BalanceSource, PoolStateSource, TokenMetadataSource};
use crate::error::LookupError;
use crate::math::tick_codec::{MAX_TICK, MIN_TICK};
use crate::models::{FeeTier, PoolSnapshot, TokenMetadata};

abigen!(
    UniswapV3Factory,
    r#"[
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool)
    ]"#
);

abigen!(
    UniswapV3Pool,
    r#"[
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
        function liquidity() external view returns (uint128)
    ]"#
);

abigen!(
    Erc20Token,
    r#"[
        function decimals() external view returns (uint8)
        function symbol() external view returns (string)
        function balanceOf(address owner) external view returns (uint256)
    ]"#
);

/// Reads pool state, token metadata and balances from a Uniswap v3 deployment.
pub struct UniswapV3Client {
    provider: Arc<Provider<Http>>,
    factory: Address,
}

impl UniswapV3Client {
    pub fn new(provider: Arc<Provider<Http>>, factory: Address) -> Self {
        Self { provider, factory }
    }

    pub async fn load_pool_snapshot(&self, token_a: Address, token_b: Address, fee: FeeTier) -> Result<Option<PoolSnapshot>> {
        let factory = UniswapV3Factory::new(self.factory, self.provider.clone());
        let pool_addr = factory
            .get_pool(token_a, token_b, fee.code())
            .call()
            .await
            .context("factory getPool failed")?;
        if pool_addr == Address::zero() {
            log::debug!("No pool for {:?}/{:?} at fee {}", token_a, token_b, fee.code());
            return Ok(None);
        }

        let pool = UniswapV3Pool::new(pool_addr, self.provider.clone());
        let slot0_call = pool.slot_0();
        let liquidity_call = pool.liquidity();
        let (slot0, liquidity) = tokio::try_join!(slot0_call.call(), liquidity_call.call())
            .context("pool slot0/liquidity read failed")?;

        let (sqrt_price_x96, tick, ..) = slot0;
        if sqrt_price_x96.is_zero() {
            // deployed but never initialized
            return Ok(None);
        }

        log::debug!("Pool {:?} tick: {}, liquidity: {}", pool_addr, tick, liquidity);

        Ok(Some(PoolSnapshot {
            sqrt_price_x96: u256_to_bigint(sqrt_price_x96),
            tick,
            liquidity: BigInt::from(liquidity),
        }))
    }

    pub async fn load_token_metadata(&self, token: Address) -> Result<TokenMetadata> {
        let erc20 = Erc20Token::new(token, self.provider.clone());
        let decimals_call = erc20.decimals();
        let symbol_call = erc20.symbol();
        let (decimals, symbol) = tokio::try_join!(decimals_call.call(), symbol_call.call())
            .with_context(|| format!("metadata read failed for {:?}", token))?;
        Ok(TokenMetadata { decimals, symbol })
    }

    pub async fn load_balance(&self, token: Address, owner: Address) -> Result<BigInt> {
        let erc20 = Erc20Token::new(token, self.provider.clone());
        let balance = erc20
            .balance_of(owner)
            .call()
            .await
            .with_context(|| format!("balanceOf failed for {:?}", token))?;
        Ok(u256_to_bigint(balance))
    }
}

fn rpc_error(e: anyhow::Error) -> LookupError {
    LookupError::Rpc(format!("{:#}", e))
}

impl PoolStateSource for UniswapV3Client {
    fn pool_snapshot(&self, token_a: Address, token_b: Address, fee: FeeTier)
        -> BoxFuture<'_, Result<Option<PoolSnapshot>, LookupError>>
    {
        async move {
            match self.load_pool_snapshot(token_a, token_b, fee).await.map_err(rpc_error)? {
                Some(snapshot) if !(MIN_TICK..=MAX_TICK).contains(&snapshot.tick) => {
                    Err(LookupError::InvalidResponse(format!("pool tick {} out of range", snapshot.tick)))
                }
                other => Ok(other),
            }
        }
        .boxed()
    }
}

impl TokenMetadataSource for UniswapV3Client {
    fn token_metadata(&self, token: Address) -> BoxFuture<'_, Result<TokenMetadata, LookupError>> {
        async move { self.load_token_metadata(token).await.map_err(rpc_error) }.boxed()
    }
}

impl BalanceSource for UniswapV3Client {
    fn balance_of(&self, token: Address, owner: Address) -> BoxFuture<'_, Result<BigInt, LookupError>> {
        async move { self.load_balance(token, owner).await.map_err(rpc_error) }.boxed()
    }
}

fn u256_to_bigint(u: U256) -> BigInt {
    let mut buf = [0u8; 32];
    u.to_big_endian(&mut buf);
    BigInt::from_bytes_be(Sign::Plus, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u256_to_bigint() {
        assert_eq!(u256_to_bigint(U256::zero()), BigInt::from(0u8));
        assert_eq!(u256_to_bigint(U256::from(12345u64)), BigInt::from(12345u64));
        let big = U256::from_dec_str("1461446703485210103287273052203988822378723970342").unwrap();
        assert_eq!(u256_to_bigint(big).to_string(), "1461446703485210103287273052203988822378723970342");
    }

    #[test]
    fn test_client_creation() {
        let provider = Provider::<Http>::try_from("http://localhost:8545").unwrap();
        let _client = UniswapV3Client::new(Arc::new(provider), Address::zero());
    }
}
