//! `siftledger-auth`: the access gateway.
//!
//! Resolves a caller identity (the seller) from a bearer credential. Token
//! issuance and credential hashing live outside this crate; it only verifies.

pub mod claims;
pub mod gateway;

pub use claims::{SellerClaims, validate_claims};
pub use gateway::{AuthError, Hs256JwtValidator, JwtValidator, resolve_caller};
