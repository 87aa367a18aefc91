//! Engine wiring for the HTTP layer.

use siftledger_core::{OrderId, ProductId};
use siftledger_infra::{InMemorySellerStore, LockPolicy, ReconciliationEngine};
use siftledger_inventory::StockRecord;
use siftledger_orders::Order;

pub type ProductStore = InMemorySellerStore<ProductId, StockRecord>;
pub type OrderStore = InMemorySellerStore<OrderId, Order>;

/// Shared application services handed to every handler.
#[derive(Debug)]
pub struct AppServices {
    pub engine: ReconciliationEngine<ProductStore, OrderStore>,
}

impl AppServices {
    pub fn in_memory(policy: LockPolicy) -> Self {
        Self {
            engine: ReconciliationEngine::new(
                InMemorySellerStore::new(),
                InMemorySellerStore::new(),
                policy,
            ),
        }
    }

    pub fn store_kind(&self) -> &'static str {
        "in_memory"
    }
}
