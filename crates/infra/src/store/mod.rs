//! Seller-isolated entity storage abstractions.

pub mod seller_store;

pub use seller_store::{InMemorySellerStore, SellerStore};
