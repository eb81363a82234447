use std::env;
use std::time::Duration;

use crate::engine::range::ClampPolicy;

/// Uniswap v3 factory on Ethereum mainnet.
pub const DEFAULT_UNISWAP_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub uniswap_v3_factory: String,
    pub port: u16,

    // Engine tuning
    pub tick_spacing: i32,
    pub recompute_debounce_ms: u64,

    // Range tokens
    pub range_token_secret: String,
    pub range_token_ttl_secs: i64,

    /// Token addresses offered by new sessions.
    pub token_list: Vec<String>,
}

/// Engine settings shared by every session.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub tick_spacing: i32,
    pub debounce: Duration,
    pub clamp: ClampPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_spacing: 60,
            debounce: Duration::from_millis(500),
            clamp: ClampPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load configuration files (secrets first, then public config)
        dotenv::from_filename("secrets.env").ok();
        dotenv::dotenv().ok();

        let tick_spacing: i32 = env::var("TICK_SPACING")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);
        if tick_spacing <= 0 {
            return Err("TICK_SPACING must be positive".into());
        }

        Ok(Config {
            rpc_url: env::var("RPC_URL")
                .map_err(|_| "RPC_URL must be set")?,
            uniswap_v3_factory: env::var("UNISWAP_V3_FACTORY")
                .unwrap_or_else(|_| DEFAULT_UNISWAP_V3_FACTORY.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),

            tick_spacing,
            recompute_debounce_ms: env::var("RECOMPUTE_DEBOUNCE_MS")
                .unwrap_or_else(|_| "500".to_string()).parse().unwrap_or(500),

            range_token_secret: env::var("RANGE_TOKEN_SECRET")
                .map_err(|_| "RANGE_TOKEN_SECRET must be set")?,
            range_token_ttl_secs: env::var("RANGE_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string()).parse().unwrap_or(3600),

            token_list: parse_token_list(&env::var("TOKEN_LIST").unwrap_or_default()),
        })
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            tick_spacing: self.tick_spacing,
            debounce: Duration::from_millis(self.recompute_debounce_ms),
            clamp: ClampPolicy::default(),
        }
    }
}

fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_list() {
        assert!(parse_token_list("").is_empty());
        assert_eq!(parse_token_list(" 0xaa, ,0xbb "), vec!["0xaa".to_string(), "0xbb".to_string()]);
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.tick_spacing, 60);
        assert_eq!(engine.debounce, Duration::from_millis(500));
    }
}
