use rocket::serde::{Deserialize, Serialize};

use crate::models::Side;

#[derive(Deserialize, rocket::FromForm)]
pub struct TokenAmountQuery {
    pub token_a: String,
    pub token_b: String,
    pub fee: u32,
    /// "a" or "b": which amount is authoritative.
    pub direction: String,
    pub amount: String,
    /// Human price (A per B), only used when the pool does not exist yet.
    pub current_price: Option<f64>,
    pub min_price: f64,
    pub max_price: f64,
}

#[derive(Serialize, Deserialize)]
pub struct TokenAmountResponse {
    pub amount_a: String,
    pub amount_b: String,
    /// Input that cannot fund the range on its own, if any.
    pub hidden: Option<Side>,
}

#[derive(Serialize, Deserialize)]
pub struct PriceToTickResponse {
    pub price: f64,
    pub tick: i32,
    pub usable_tick: i32,
    pub sqrt_price_x96: String,
}

#[derive(Serialize, Deserialize)]
pub struct TickToPriceResponse {
    pub tick: i32,
    pub price: f64,
    pub sqrt_price_x96: String,
}

#[derive(Serialize, Deserialize)]
pub struct ValidateRangeResponse {
    pub min_price: f64,
    pub max_price: f64,
    pub valid: bool,
}

#[derive(Serialize, Deserialize)]
pub struct RangeTokenRequest {
    pub id: String,
    pub amount_a: String,
    pub amount_b: String,
}

#[derive(Serialize, Deserialize)]
pub struct RangeTokenResponse {
    pub token: String,
}
