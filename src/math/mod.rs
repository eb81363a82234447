pub mod liquidity_amounts;
pub mod orientation;
pub mod tick_codec;
pub mod units;
