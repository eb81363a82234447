pub mod lookups;
pub mod memory;
pub mod providers;
pub mod range_token;
pub mod uniswap_v3_client;
