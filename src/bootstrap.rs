use std::str::FromStr;
use std::sync::Arc;

use ethers::prelude::*;

use crate::chain::lookups::MarketLookups;
use crate::chain::{providers, range_token::KeccakTokenIssuer, uniswap_v3_client::UniswapV3Client};
use crate::config::{Config, EngineConfig};

pub struct AppState {
    pub lookups: Arc<dyn MarketLookups>,
    pub issuer: KeccakTokenIssuer,
    pub engine: EngineConfig,

    /// Addresses offered to new sessions by the token-list load step.
    pub token_list: Vec<Address>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let provider = providers::create_provider(&config.rpc_url)?;
        let factory = Address::from_str(&config.uniswap_v3_factory)?;
        let client = UniswapV3Client::new(provider, factory);

        let issuer = KeccakTokenIssuer::new(
            config.range_token_secret.as_bytes(),
            chrono::Duration::seconds(config.range_token_ttl_secs),
        );

        let token_list = config
            .token_list
            .iter()
            .map(|addr| Address::from_str(addr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AppState::with_lookups(Arc::new(client), issuer, config.engine(), token_list))
    }

    /// State around an arbitrary lookup backend (the in-memory chain in tests).
    pub fn with_lookups(
        lookups: Arc<dyn MarketLookups>,
        issuer: KeccakTokenIssuer,
        engine: EngineConfig,
        token_list: Vec<Address>,
    ) -> Self {
        AppState { lookups, issuer, engine, token_list }
    }
}
