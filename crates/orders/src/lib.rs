//! Orders domain module.
//!
//! Business rules for a seller's orders: appending line items on placement,
//! completing sifting (in full or by splitting off a completed portion) and
//! keeping the grand total equal to the sum of the current line items.
//! Implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod line;
pub mod order;

pub use line::{LineStatus, NewLine, OrderLineItem};
pub use order::{CompleteSifting, Order, SiftOutcome};
