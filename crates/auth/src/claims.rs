use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use siftledger_core::SellerId;

use crate::gateway::AuthError;

/// Bearer token claims model (transport-agnostic).
///
/// The minimal set of claims expected once a token has been decoded and its
/// signature verified. Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerClaims {
    /// Subject: the seller the caller acts as.
    pub sub: SellerId,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

impl SellerClaims {
    pub fn new(sub: SellerId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Deterministically validate the claims' time window.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// the validator before this is called.
pub fn validate_claims(claims: &SellerClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    let (Some(issued_at), Some(expires_at)) = (claims.issued_at(), claims.expires_at()) else {
        return Err(AuthError::InvalidTimeWindow);
    };
    if expires_at <= issued_at {
        return Err(AuthError::InvalidTimeWindow);
    }
    if now < issued_at {
        return Err(AuthError::NotYetValid);
    }
    if now >= expires_at {
        return Err(AuthError::Expired);
    }
    Ok(())
}
