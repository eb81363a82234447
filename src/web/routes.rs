use std::str::FromStr;
use std::sync::Arc;

use ethers::types::Address;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, routes, Route, State};

use crate::bootstrap::AppState;
use crate::chain::range_token::{RangeClaim, RangeTokenIssuer};
use crate::engine::amount_calculator::{AmountRequest, MarketView};
use crate::engine::form::fetch_token_list;
use crate::engine::range::validate_range;
use crate::error::RangeTokenError;
use crate::math::tick_codec::{get_sqrt_ratio_at_tick, nearest_usable_tick, price_to_sqrt_fixed, price_to_tick, tick_to_price, MAX_TICK, MIN_TICK};
use crate::models::{AmountPair, FeeTier, PriceRange, Side, TokenDescriptor};
use crate::web::dto::{
    PriceToTickResponse, RangeTokenRequest, RangeTokenResponse, TickToPriceResponse, TokenAmountQuery,
    TokenAmountResponse, ValidateRangeResponse,
};

pub fn api_routes() -> Vec<Route> {
    routes![health, list_tokens, price_to_tick_route, tick_to_price_route, validate_range_route, token_amount, issue_range_token, read_range_token]
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

/// Descriptors for the configured token list; unreadable tokens are left out.
#[get("/api/v1/tokens")]
pub async fn list_tokens(app_state: &State<Arc<AppState>>) -> Json<Vec<TokenDescriptor>> {
    Json(fetch_token_list(&app_state.token_list, app_state.lookups.as_ref()).await)
}

/// Codec view on a raw pool price (token1 per token0).
#[get("/api/v1/price-to-tick?<price>&<spacing>")]
pub fn price_to_tick_route(price: f64, spacing: Option<i32>, app_state: &State<Arc<AppState>>) -> Result<Json<PriceToTickResponse>, Status> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Status::BadRequest);
    }
    let spacing = spacing.unwrap_or(app_state.engine.tick_spacing).max(1);
    let tick = price_to_tick(price);
    Ok(Json(PriceToTickResponse {
        price,
        tick,
        usable_tick: nearest_usable_tick(tick, spacing),
        sqrt_price_x96: price_to_sqrt_fixed(price).to_string(),
    }))
}

#[get("/api/v1/tick-to-price?<tick>")]
pub fn tick_to_price_route(tick: i32) -> Result<Json<TickToPriceResponse>, Status> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(Status::BadRequest);
    }
    Ok(Json(TickToPriceResponse {
        tick,
        price: tick_to_price(tick),
        sqrt_price_x96: get_sqrt_ratio_at_tick(tick).to_string(),
    }))
}

#[get("/api/v1/validate-range?<min_price>&<max_price>")]
pub fn validate_range_route(min_price: f64, max_price: f64) -> Json<ValidateRangeResponse> {
    Json(ValidateRangeResponse { min_price, max_price, valid: validate_range(min_price, max_price) })
}

#[get("/api/v1/token-amount?<query..>")]
pub async fn token_amount(
    query: TokenAmountQuery,
    app_state: &State<Arc<AppState>>,
) -> Result<Json<TokenAmountResponse>, Status> {
    let request = parse_amount_query(&query, app_state.engine.tick_spacing).map_err(|e| {
        log::warn!("Rejected token-amount query: {}", e);
        Status::BadRequest
    })?;

    let view = MarketView::read(request.token_a, request.token_b, request.fee, app_state.lookups.as_ref()).await;
    let (pair, hidden) = match view {
        Ok(view) => (view.amounts(&request), view.hidden_side(&request)),
        Err(e) => {
            log::warn!("Market read failed for token-amount: {}", e);
            (AmountPair::zero(), None)
        }
    };
    let AmountPair { amount_a, amount_b } = pair;
    Ok(Json(TokenAmountResponse { amount_a, amount_b, hidden }))
}

fn parse_amount_query(query: &TokenAmountQuery, tick_spacing: i32) -> Result<AmountRequest, String> {
    let token_a = Address::from_str(&query.token_a).map_err(|e| format!("token_a: {}", e))?;
    let token_b = Address::from_str(&query.token_b).map_err(|e| format!("token_b: {}", e))?;
    if token_a == token_b {
        return Err("token_a and token_b must differ".to_string());
    }
    let fee = FeeTier::from_code(query.fee).ok_or_else(|| format!("unsupported fee {}", query.fee))?;
    let direction = Side::from_str(&query.direction)?;
    Ok(AmountRequest {
        token_a,
        token_b,
        fee,
        direction,
        amount: query.amount.clone(),
        current_price: query.current_price.unwrap_or(0.0),
        range: PriceRange::new(query.min_price, query.max_price),
        tick_spacing,
    })
}

#[post("/api/v1/range-token", format = "json", data = "<body>")]
pub fn issue_range_token(body: Json<RangeTokenRequest>, app_state: &State<Arc<AppState>>) -> Result<Json<RangeTokenResponse>, Status> {
    let amounts = AmountPair::new(body.amount_a.clone(), body.amount_b.clone());
    match app_state.issuer.sign_range_token(&body.id, &amounts) {
        Ok(token) => Ok(Json(RangeTokenResponse { token })),
        Err(e) => {
            log::error!("Failed to sign range token: {}", e);
            Err(Status::InternalServerError)
        }
    }
}

#[get("/api/v1/range-token/<token>")]
pub fn read_range_token(token: &str, app_state: &State<Arc<AppState>>) -> Result<Json<RangeClaim>, Status> {
    app_state.issuer.verify_range_token(token).map(Json).map_err(|e| match e {
        RangeTokenError::Malformed | RangeTokenError::Encoding(_) => Status::BadRequest,
        RangeTokenError::BadSignature | RangeTokenError::Expired => Status::Unauthorized,
    })
}
