use thiserror::Error;

/// Failures of the external collaborators (pool state, token metadata, balances).
/// A pool that does not exist is not an error; lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("rpc call failed: {0}")]
    Rpc(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("unknown token {0}")]
    UnknownToken(String),
}

/// Internal failures of the amount calculator. These never escape the calculator;
/// they are mapped to the zero amount pair.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("malformed amount {0:?}")]
    MalformedAmount(String),
    #[error("invalid price range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid current price {0}")]
    InvalidPrice(f64),
    #[error("raw amount exceeds sanity ceiling")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum RangeTokenError {
    #[error("malformed range token")]
    Malformed,
    #[error("range token signature mismatch")]
    BadSignature,
    #[error("range token expired")]
    Expired,
    #[error("range token encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
