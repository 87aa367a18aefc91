//! Infrastructure layer: seller-isolated stores, per-seller locking, the
//! reconciliation engine and summary aggregation.

pub mod engine;
pub mod locks;
pub mod store;
pub mod summary;

pub use engine::{EngineError, EngineResult, OrderRequestLine, ProductFields, ReconciliationEngine};
pub use locks::{LockError, LockPolicy, SellerLocks};
pub use store::{InMemorySellerStore, SellerStore};
pub use summary::{ProductSummary, SummaryReport, summarize};
