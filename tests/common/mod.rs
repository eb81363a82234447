// Shared market fixture: two 18-decimal tokens, A sorting before B.
#![allow(dead_code)]

use std::sync::Arc;

use ethers::types::Address;
use num_bigint::BigInt;
use range_wizard::chain::memory::MemoryChain;
use range_wizard::models::{FeeTier, TokenDescriptor};

pub const POOL_PRICE: f64 = 5000.0;

pub fn token_a() -> Address {
    Address::from_low_u64_be(0xa)
}

pub fn token_b() -> Address {
    Address::from_low_u64_be(0xb)
}

pub fn owner() -> Address {
    Address::from_low_u64_be(0x0e)
}

pub fn descriptor(label: &str, address: Address) -> TokenDescriptor {
    TokenDescriptor { label: label.to_string(), address }
}

pub fn raw(whole: u64) -> BigInt {
    BigInt::from(whole) * BigInt::from(10u8).pow(18)
}

/// Both tokens registered, no pool yet.
pub fn empty_market() -> Arc<MemoryChain> {
    let chain = MemoryChain::new();
    chain.add_token(token_a(), "AAA", 18);
    chain.add_token(token_b(), "BBB", 18);
    Arc::new(chain)
}

/// A live 0.30% pool at 5000 A per B, and an owner holding plenty of both tokens.
pub fn live_market() -> Arc<MemoryChain> {
    let chain = empty_market();
    chain
        .set_pool_at_price(token_a(), token_b(), FeeTier::Medium, POOL_PRICE, raw(1_000))
        .expect("tokens are registered");
    chain.set_balance(token_a(), owner(), raw(1_000_000));
    chain.set_balance(token_b(), owner(), raw(1_000_000));
    chain
}
