use ethers::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// HTTP provider for read-only pool, token and balance queries.
pub fn create_provider(rpc_url: &str) -> Result<Arc<Provider<Http>>, Box<dyn std::error::Error>> {
    let provider = Provider::<Http>::try_from(rpc_url)?.interval(Duration::from_millis(2_000));
    log::info!("HTTP provider ready");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        assert!(create_provider("not a url").is_err());
        assert!(create_provider("http://localhost:8545").is_ok());
    }
}
