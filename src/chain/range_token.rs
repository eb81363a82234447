// Signed range tokens let another page look up a position's amounts without
// re-deriving them. Format: hex(json claim) "." hex(keccak256(secret || json claim)).

use chrono::{DateTime, Duration, Utc};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::error::RangeTokenError;
use crate::models::AmountPair;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeClaim {
    pub id: String,
    pub amount_a: String,
    pub amount_b: String,
    pub expires_at: DateTime<Utc>,
}

pub trait RangeTokenIssuer: Send + Sync {
    fn sign_range_token(&self, id: &str, amounts: &AmountPair) -> Result<String, RangeTokenError>;
    fn verify_range_token(&self, token: &str) -> Result<RangeClaim, RangeTokenError>;
}

pub struct KeccakTokenIssuer {
    secret: Vec<u8>,
    ttl: Duration,
}

impl KeccakTokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self { secret: secret.into(), ttl }
    }

    fn mac(&self, payload: &[u8]) -> [u8; 32] {
        let mut buf = Vec::with_capacity(self.secret.len() + payload.len());
        buf.extend_from_slice(&self.secret);
        buf.extend_from_slice(payload);
        keccak256(buf)
    }

    pub fn sign_at(&self, id: &str, amounts: &AmountPair, now: DateTime<Utc>) -> Result<String, RangeTokenError> {
        let claim = RangeClaim {
            id: id.to_string(),
            amount_a: amounts.amount_a.clone(),
            amount_b: amounts.amount_b.clone(),
            expires_at: now + self.ttl,
        };
        let payload = serde_json::to_vec(&claim)?;
        Ok(format!("{}.{}", hex::encode(&payload), hex::encode(self.mac(&payload))))
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<RangeClaim, RangeTokenError> {
        let (payload_hex, mac_hex) = token.split_once('.').ok_or(RangeTokenError::Malformed)?;
        let payload = hex::decode(payload_hex).map_err(|_| RangeTokenError::Malformed)?;
        let mac = hex::decode(mac_hex).map_err(|_| RangeTokenError::Malformed)?;
        if mac.as_slice() != self.mac(&payload).as_slice() {
            return Err(RangeTokenError::BadSignature);
        }
        let claim: RangeClaim = serde_json::from_slice(&payload)?;
        if claim.expires_at <= now {
            return Err(RangeTokenError::Expired);
        }
        Ok(claim)
    }
}

impl RangeTokenIssuer for KeccakTokenIssuer {
    fn sign_range_token(&self, id: &str, amounts: &AmountPair) -> Result<String, RangeTokenError> {
        self.sign_at(id, amounts, Utc::now())
    }

    fn verify_range_token(&self, token: &str) -> Result<RangeClaim, RangeTokenError> {
        self.verify_at(token, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> KeccakTokenIssuer {
        KeccakTokenIssuer::new("test-secret", Duration::minutes(10))
    }

    #[test]
    fn test_sign_then_verify() {
        let issuer = issuer();
        let token = issuer.sign_range_token("pos-1", &AmountPair::new("10", "4.5")).unwrap();
        let claim = issuer.verify_range_token(&token).unwrap();
        assert_eq!(claim.id, "pos-1");
        assert_eq!(claim.amount_a, "10");
        assert_eq!(claim.amount_b, "4.5");
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let issuer = issuer();
        let token = issuer.sign_range_token("pos-1", &AmountPair::new("10", "4.5")).unwrap();
        let (_, mac) = token.split_once('.').unwrap();
        let forged_claim = serde_json::to_vec(&RangeClaim {
            id: "pos-1".into(),
            amount_a: "1000".into(),
            amount_b: "4.5".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        })
        .unwrap();
        let forged = format!("{}.{}", hex::encode(forged_claim), mac);
        assert!(matches!(issuer.verify_range_token(&forged), Err(RangeTokenError::BadSignature)));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = issuer().sign_range_token("pos-1", &AmountPair::zero()).unwrap();
        let other = KeccakTokenIssuer::new("other", Duration::minutes(10));
        assert!(matches!(other.verify_range_token(&token), Err(RangeTokenError::BadSignature)));
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let now = Utc::now();
        let token = issuer.sign_at("pos-1", &AmountPair::zero(), now).unwrap();
        let later = now + Duration::minutes(11);
        assert!(matches!(issuer.verify_at(&token, later), Err(RangeTokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(issuer().verify_range_token("nope"), Err(RangeTokenError::Malformed)));
        assert!(matches!(issuer().verify_range_token("zz.zz"), Err(RangeTokenError::Malformed)));
    }
}
