//! Inventory domain module.
//!
//! Business rules for a seller's stock: product registration, restocking and
//! the all-or-nothing stock withdrawal performed when an order is placed.
//! Implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod ledger;
pub mod stock;

pub use ledger::{InventoryLedger, StockRequest, Withdrawal, WithdrawnLine};
pub use stock::{ItemType, RegisterStock, StockRecord};
