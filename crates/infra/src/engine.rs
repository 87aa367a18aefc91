//! Reconciliation engine: the seller-scoped command pipeline.
//!
//! Every mutating operation follows the same shape:
//!
//! ```text
//! validate input (no IO)
//!   ↓
//! acquire the seller lock (bounded wait, Busy on timeout)
//!   ↓
//! load the seller's stock records / orders from the stores
//!   ↓
//! decide + mutate in memory (pure domain logic; errors abort here)
//!   ↓
//! persist every changed entity
//! ```
//!
//! Nothing is written until the domain step has succeeded, so a rejected
//! operation leaves persisted state untouched.

use chrono::Utc;
use thiserror::Error;

use siftledger_core::{DomainError, LineItemId, OrderId, ProductId, SellerId};
use siftledger_inventory::{InventoryLedger, ItemType, RegisterStock, StockRecord, StockRequest};
use siftledger_orders::{CompleteSifting, LineStatus, NewLine, Order, OrderLineItem, SiftOutcome};

use crate::locks::{LockError, LockPolicy, SellerGuard, SellerLocks};
use crate::store::SellerStore;
use crate::summary::{SummaryReport, summarize};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Deterministic rejection (validation, not found, conflict).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The seller lock could not be acquired in time. Safe to retry.
    #[error("seller {seller_id} is busy (waited {waited_ms} ms)")]
    Busy { seller_id: SellerId, waited_ms: u64 },
}

impl From<LockError> for EngineError {
    fn from(value: LockError) -> Self {
        match value {
            LockError::Timeout {
                seller_id,
                waited_ms,
            } => EngineError::Busy {
                seller_id,
                waited_ms,
            },
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Fields of a product registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub selling_price: i64,
    pub cost_price: i64,
    pub quantity: i64,
    pub item_type: ItemType,
    pub product_type: String,
    pub category: String,
    pub image: String,
}

/// One requested line of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequestLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Defaults to `sifting`.
    pub status: Option<LineStatus>,
}

/// Seller-scoped inventory/order operations over pluggable stores.
#[derive(Debug)]
pub struct ReconciliationEngine<P, O> {
    products: P,
    orders: O,
    locks: SellerLocks,
}

impl<P, O> ReconciliationEngine<P, O>
where
    P: SellerStore<ProductId, StockRecord>,
    O: SellerStore<OrderId, Order>,
{
    pub fn new(products: P, orders: O, policy: LockPolicy) -> Self {
        Self {
            products,
            orders,
            locks: SellerLocks::new(policy),
        }
    }

    async fn lock(&self, seller_id: SellerId) -> EngineResult<SellerGuard> {
        Ok(self.locks.acquire(seller_id).await?)
    }

    fn ledger(&self, seller_id: SellerId) -> EngineResult<InventoryLedger> {
        Ok(InventoryLedger::load(seller_id, self.products.list(seller_id))?)
    }

    fn product(&self, seller_id: SellerId, product_id: ProductId) -> EngineResult<StockRecord> {
        self.products
            .get(seller_id, &product_id)
            .ok_or_else(|| DomainError::not_found("product", product_id).into())
    }

    fn order(&self, seller_id: SellerId, order_id: OrderId) -> EngineResult<Order> {
        self.orders
            .get(seller_id, &order_id)
            .ok_or_else(|| DomainError::not_found("order", order_id).into())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inventory
    // ─────────────────────────────────────────────────────────────────────

    /// Register a new stock record (creating the seller's inventory lazily).
    #[tracing::instrument(skip_all, fields(seller_id = %seller_id))]
    pub async fn register_product(
        &self,
        seller_id: SellerId,
        input: ProductFields,
    ) -> EngineResult<StockRecord> {
        let record = StockRecord::register(&RegisterStock {
            seller_id,
            product_id: ProductId::new(),
            name: input.name,
            selling_price: input.selling_price,
            cost_price: input.cost_price,
            quantity: input.quantity,
            item_type: input.item_type,
            product_type: input.product_type,
            category: input.category,
            image: input.image,
            occurred_at: Utc::now(),
        })?;

        let _guard = self.lock(seller_id).await?;
        self.products
            .upsert(seller_id, record.id_typed(), record.clone());

        tracing::info!(product_id = %record.id_typed(), quantity = record.quantity_on_hand(), "product registered");
        Ok(record)
    }

    pub async fn list_products(&self, seller_id: SellerId) -> EngineResult<Vec<StockRecord>> {
        let _guard = self.lock(seller_id).await?;
        Ok(self.products.list(seller_id))
    }

    pub async fn list_products_by_type(
        &self,
        seller_id: SellerId,
        item_type: ItemType,
    ) -> EngineResult<Vec<StockRecord>> {
        let _guard = self.lock(seller_id).await?;
        match InventoryLedger::load(seller_id, self.products.list(seller_id)) {
            Ok(ledger) => Ok(ledger.of_type(item_type).into_iter().cloned().collect()),
            // No inventory yet.
            Err(_) => Ok(Vec::new()),
        }
    }

    pub async fn get_product(&self, seller_id: SellerId, product_id: ProductId) -> EngineResult<StockRecord> {
        let _guard = self.lock(seller_id).await?;
        self.product(seller_id, product_id)
    }

    /// Add units to a product's quantity on hand.
    #[tracing::instrument(skip_all, fields(seller_id = %seller_id, product_id = %product_id, additional_quantity = additional_quantity))]
    pub async fn restock(
        &self,
        seller_id: SellerId,
        product_id: ProductId,
        additional_quantity: i64,
    ) -> EngineResult<StockRecord> {
        let _guard = self.lock(seller_id).await?;

        let mut record = self.product(seller_id, product_id)?;
        record.restock(additional_quantity, Utc::now())?;
        self.products.upsert(seller_id, product_id, record.clone());

        tracing::info!(quantity = record.quantity_on_hand(), "product restocked");
        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Orders
    // ─────────────────────────────────────────────────────────────────────

    /// Place an order: withdraw stock for every line and append them to the
    /// seller's order, or change nothing at all.
    #[tracing::instrument(skip_all, fields(seller_id = %seller_id, lines = lines.len()))]
    pub async fn place_order(
        &self,
        seller_id: SellerId,
        lines: Vec<OrderRequestLine>,
    ) -> EngineResult<Order> {
        if lines.is_empty() {
            return Err(DomainError::validation("products", "at least one product is required").into());
        }
        let requests = lines
            .iter()
            .map(|l| {
                Ok(StockRequest {
                    product_id: l.product_id,
                    quantity: siftledger_core::validate::positive("quantity", l.quantity)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let _guard = self.lock(seller_id).await?;
        let now = Utc::now();

        let mut ledger = self.ledger(seller_id)?;
        let withdrawal = ledger.withdraw(&requests, now).map_err(|e| {
            tracing::debug!(error = %e, "placement rejected");
            e
        })?;

        let mut order = match self.orders.list(seller_id).into_iter().next() {
            Some(order) => order,
            None => Order::open(OrderId::new(), seller_id, now),
        };

        let new_lines = withdrawal
            .lines
            .iter()
            .zip(&lines)
            .map(|(w, l)| NewLine {
                item_id: LineItemId::new(),
                product_id: w.product_id,
                product_name: w.product_name.clone(),
                quantity: w.quantity,
                unit_price: w.unit_price,
                status: l.status.unwrap_or_default(),
            })
            .collect();
        order.append_lines(new_lines, now)?;

        self.products.upsert_batch(
            seller_id,
            withdrawal
                .updated
                .into_iter()
                .map(|r| (r.id_typed(), r))
                .collect(),
        );
        self.orders.upsert(seller_id, order.id_typed(), order.clone());

        tracing::info!(order_id = %order.id_typed(), grand_total = order.grand_total(), "order placed");
        Ok(order)
    }

    /// All of the seller's orders, newest first.
    pub async fn list_orders(&self, seller_id: SellerId) -> EngineResult<Vec<Order>> {
        let _guard = self.lock(seller_id).await?;
        let mut orders = self.orders.list(seller_id);
        orders.reverse();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    /// Line items with the given status across all of the seller's orders.
    pub async fn list_items_by_status(
        &self,
        seller_id: SellerId,
        status: LineStatus,
    ) -> EngineResult<Vec<OrderLineItem>> {
        let _guard = self.lock(seller_id).await?;
        Ok(self
            .orders
            .list(seller_id)
            .iter()
            .flat_map(|o| o.items_with_status(status).cloned())
            .collect())
    }

    pub async fn get_order_item(
        &self,
        seller_id: SellerId,
        order_id: OrderId,
        item_id: LineItemId,
    ) -> EngineResult<OrderLineItem> {
        let _guard = self.lock(seller_id).await?;
        let order = self.order(seller_id, order_id)?;
        order
            .item(&item_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("order item", item_id).into())
    }

    /// Complete sifting for a line item, in full or by splitting off `quantity` units.
    #[tracing::instrument(skip_all, fields(seller_id = %seller_id, order_id = %order_id, item_id = %item_id, quantity = ?quantity))]
    pub async fn complete_sifting(
        &self,
        seller_id: SellerId,
        order_id: OrderId,
        item_id: LineItemId,
        quantity: Option<i64>,
    ) -> EngineResult<Order> {
        let _guard = self.lock(seller_id).await?;

        let mut order = self.order(seller_id, order_id)?;
        let outcome = order
            .complete_sifting(&CompleteSifting {
                item_id,
                quantity,
                split_item_id: LineItemId::new(),
                occurred_at: Utc::now(),
            })
            .map_err(|e| {
                tracing::debug!(error = %e, "sifting completion rejected");
                e
            })?;
        self.orders.upsert(seller_id, order_id, order.clone());

        match outcome {
            SiftOutcome::Completed { .. } => tracing::info!("item sifted"),
            SiftOutcome::Split { sifted, remaining } => {
                tracing::info!(sifted_item_id = %sifted, fully_sifted = remaining.is_none(), "item split")
            }
        }
        Ok(order)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reporting
    // ─────────────────────────────────────────────────────────────────────

    /// Sales summary from one consistent snapshot of records and orders.
    pub async fn summary(&self, seller_id: SellerId) -> EngineResult<SummaryReport> {
        let _guard = self.lock(seller_id).await?;
        let records = self.products.list(seller_id);
        let orders = self.orders.list(seller_id);
        Ok(summarize(&records, &orders)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::Duration;

    use super::*;
    use crate::store::InMemorySellerStore;

    type TestEngine = ReconciliationEngine<
        InMemorySellerStore<ProductId, StockRecord>,
        InMemorySellerStore<OrderId, Order>,
    >;

    fn engine() -> TestEngine {
        ReconciliationEngine::new(
            InMemorySellerStore::new(),
            InMemorySellerStore::new(),
            LockPolicy::default(),
        )
    }

    fn fields(name: &str, price: i64, cost: i64, quantity: i64) -> ProductFields {
        ProductFields {
            name: name.to_string(),
            selling_price: price,
            cost_price: cost,
            quantity,
            item_type: ItemType::SingleItem,
            product_type: "grain".to_string(),
            category: "food".to_string(),
            image: "rice.png".to_string(),
        }
    }

    fn line(product_id: ProductId, quantity: i64) -> OrderRequestLine {
        OrderRequestLine {
            product_id,
            quantity,
            status: None,
        }
    }

    fn sifting_items(order: &Order) -> Vec<&OrderLineItem> {
        order.items_with_status(LineStatus::Sifting).collect()
    }

    #[tokio::test]
    async fn placement_withdraws_stock_and_prices_lines() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine
            .register_product(seller, fields("Rice", 5, 2, 10))
            .await
            .unwrap();

        let order = engine
            .place_order(seller, vec![line(p.id_typed(), 4)])
            .await
            .unwrap();

        assert_eq!(engine.get_product(seller, p.id_typed()).await.unwrap().quantity_on_hand(), 6);
        assert_eq!(order.items().len(), 1);
        let item = &order.items()[0];
        assert_eq!(item.quantity(), 4);
        assert_eq!(item.unit_price(), 5);
        assert_eq!(item.total_price(), 20);
        assert_eq!(item.status(), LineStatus::Sifting);
        assert_eq!(order.grand_total(), 20);
    }

    #[tokio::test]
    async fn placements_accumulate_into_one_order() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine
            .register_product(seller, fields("Rice", 5, 2, 10))
            .await
            .unwrap();

        let first = engine.place_order(seller, vec![line(p.id_typed(), 1)]).await.unwrap();
        let second = engine.place_order(seller, vec![line(p.id_typed(), 2)]).await.unwrap();

        assert_eq!(first.id_typed(), second.id_typed());
        assert_eq!(second.items().len(), 2);
        assert_eq!(second.grand_total(), 15);
        assert_eq!(engine.list_orders(seller).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_whole_batch() {
        let engine = engine();
        let seller = SellerId::new();
        let a = engine.register_product(seller, fields("A", 5, 2, 10)).await.unwrap();
        let b = engine.register_product(seller, fields("B", 3, 1, 1)).await.unwrap();

        let err = engine
            .place_order(seller, vec![line(a.id_typed(), 2), line(b.id_typed(), 2)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(DomainError::InsufficientStock { available: 1, requested: 2, .. })
        ));
        assert_eq!(engine.get_product(seller, a.id_typed()).await.unwrap().quantity_on_hand(), 10);
        assert_eq!(engine.get_product(seller, b.id_typed()).await.unwrap().quantity_on_hand(), 1);
        assert!(engine.list_orders(seller).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_lines_are_summed_against_stock() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 5)).await.unwrap();

        let err = engine
            .place_order(seller, vec![line(p.id_typed(), 3), line(p.id_typed(), 3)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(DomainError::InsufficientStock { requested: 6, .. })
        ));
        assert_eq!(engine.get_product(seller, p.id_typed()).await.unwrap().quantity_on_hand(), 5);
    }

    #[tokio::test]
    async fn placement_without_inventory_is_not_found() {
        let engine = engine();
        let err = engine
            .place_order(SellerId::new(), vec![line(ProductId::new(), 1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(DomainError::NotFound { entity: "inventory", .. })
        ));
    }

    #[tokio::test]
    async fn placement_validates_before_touching_state() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 5)).await.unwrap();

        let empty = engine.place_order(seller, vec![]).await.unwrap_err();
        assert!(matches!(empty, EngineError::Domain(DomainError::Validation { .. })));

        let zero = engine.place_order(seller, vec![line(p.id_typed(), 0)]).await.unwrap_err();
        assert!(matches!(zero, EngineError::Domain(DomainError::Validation { .. })));

        let unknown = engine
            .place_order(seller, vec![line(p.id_typed(), 1), line(ProductId::new(), 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            unknown,
            EngineError::Domain(DomainError::NotFound { entity: "product", .. })
        ));

        assert_eq!(engine.get_product(seller, p.id_typed()).await.unwrap().quantity_on_hand(), 5);
    }

    #[tokio::test]
    async fn partial_completion_splits_then_consumes_item() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 10)).await.unwrap();
        let order = engine.place_order(seller, vec![line(p.id_typed(), 4)]).await.unwrap();
        let item_id = order.items()[0].id_typed();

        let order = engine
            .complete_sifting(seller, order.id_typed(), item_id, Some(3))
            .await
            .unwrap();
        assert_eq!(order.item(&item_id).unwrap().quantity(), 1);
        assert_eq!(order.item(&item_id).unwrap().total_price(), 5);
        let sifted: Vec<_> = order.items_with_status(LineStatus::Sifted).collect();
        assert_eq!(sifted.len(), 1);
        assert_eq!(sifted[0].quantity(), 3);
        assert_eq!(sifted[0].total_price(), 15);
        assert_eq!(order.grand_total(), 20);

        let err = engine
            .complete_sifting(seller, order.id_typed(), item_id, Some(2))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::Conflict(_))));

        let order = engine
            .complete_sifting(seller, order.id_typed(), item_id, Some(1))
            .await
            .unwrap();
        assert!(order.item(&item_id).is_none());
        assert!(sifting_items(&order).is_empty());
        assert_eq!(order.items().len(), 2);
        assert_eq!(order.grand_total(), 20);

        let summary = engine.summary(seller).await.unwrap();
        assert_eq!(summary.total_sold, 4);
        assert_eq!(summary.total_sifting, 0);
        assert_eq!(summary.total_in_stock, 6);
    }

    #[tokio::test]
    async fn full_completion_is_write_once() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 10)).await.unwrap();
        let order = engine.place_order(seller, vec![line(p.id_typed(), 2)]).await.unwrap();
        let item_id = order.items()[0].id_typed();

        engine
            .complete_sifting(seller, order.id_typed(), item_id, None)
            .await
            .unwrap();
        let item = engine.get_order_item(seller, order.id_typed(), item_id).await.unwrap();
        assert_eq!(item.status(), LineStatus::Sifted);

        let again = engine
            .complete_sifting(seller, order.id_typed(), item_id, None)
            .await
            .unwrap_err();
        assert!(matches!(again, EngineError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn completion_of_unknown_order_or_item_is_not_found() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 10)).await.unwrap();
        let order = engine.place_order(seller, vec![line(p.id_typed(), 2)]).await.unwrap();

        let no_order = engine
            .complete_sifting(seller, OrderId::new(), LineItemId::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            no_order,
            EngineError::Domain(DomainError::NotFound { entity: "order", .. })
        ));

        let no_item = engine
            .complete_sifting(seller, order.id_typed(), LineItemId::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            no_item,
            EngineError::Domain(DomainError::NotFound { entity: "order item", .. })
        ));
    }

    #[tokio::test]
    async fn sellers_never_see_each_other() {
        let engine = engine();
        let alice = SellerId::new();
        let bob = SellerId::new();
        let p = engine.register_product(alice, fields("Rice", 5, 2, 10)).await.unwrap();

        assert!(engine.list_products(bob).await.unwrap().is_empty());
        assert!(engine.get_product(bob, p.id_typed()).await.is_err());
        let err = engine.place_order(bob, vec![line(p.id_typed(), 1)]).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::NotFound { .. })));
        assert_eq!(engine.get_product(alice, p.id_typed()).await.unwrap().quantity_on_hand(), 10);
    }

    #[tokio::test]
    async fn restock_adds_units_and_rejects_non_positive() {
        let engine = engine();
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 1)).await.unwrap();

        let restocked = engine.restock(seller, p.id_typed(), 4).await.unwrap();
        assert_eq!(restocked.quantity_on_hand(), 5);

        let err = engine.restock(seller, p.id_typed(), 0).await.unwrap_err();
        assert!(matches!(err, EngineError::Domain(DomainError::Validation { .. })));
        let missing = engine.restock(seller, ProductId::new(), 1).await.unwrap_err();
        assert!(matches!(missing, EngineError::Domain(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn listings_filter_by_type_and_status() {
        let engine = engine();
        let seller = SellerId::new();
        let single = engine.register_product(seller, fields("Rice", 5, 2, 10)).await.unwrap();
        let group = engine
            .register_product(
                seller,
                ProductFields {
                    item_type: ItemType::GroupItem,
                    ..fields("Box", 50, 20, 3)
                },
            )
            .await
            .unwrap();

        let groups = engine.list_products_by_type(seller, ItemType::GroupItem).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id_typed(), group.id_typed());

        engine
            .place_order(
                seller,
                vec![
                    line(single.id_typed(), 1),
                    OrderRequestLine {
                        status: Some(LineStatus::Sifted),
                        ..line(group.id_typed(), 1)
                    },
                ],
            )
            .await
            .unwrap();

        let sifting = engine.list_items_by_status(seller, LineStatus::Sifting).await.unwrap();
        let sifted = engine.list_items_by_status(seller, LineStatus::Sifted).await.unwrap();
        assert_eq!(sifting.len(), 1);
        assert_eq!(sifting[0].product_id(), single.id_typed());
        assert_eq!(sifted.len(), 1);
        assert_eq!(sifted[0].product_id(), group.id_typed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_placements_never_oversell() {
        let engine = Arc::new(engine());
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 10)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let engine = engine.clone();
            let product_id = p.id_typed();
            handles.push(tokio::spawn(async move {
                engine.place_order(seller, vec![line(product_id, 1)]).await
            }));
        }

        let mut placed = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => placed += 1,
                Err(EngineError::Domain(DomainError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(placed, 10);
        assert_eq!(engine.get_product(seller, p.id_typed()).await.unwrap().quantity_on_hand(), 0);
        let summary = engine.summary(seller).await.unwrap();
        assert_eq!(summary.total_sifting, 10);
        assert_eq!(summary.products[0].total, 10);
    }

    #[tokio::test]
    async fn held_seller_lock_surfaces_as_busy() {
        let engine = ReconciliationEngine::new(
            InMemorySellerStore::<ProductId, StockRecord>::new(),
            InMemorySellerStore::<OrderId, Order>::new(),
            LockPolicy {
                max_wait: Duration::from_millis(30),
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
            },
        );
        let seller = SellerId::new();

        let _held = engine.locks.acquire(seller).await.unwrap();
        let err = engine.restock(seller, ProductId::new(), 1).await.unwrap_err();

        assert!(matches!(err, EngineError::Busy { seller_id, .. } if seller_id == seller));
    }

    /// Product store that, once armed, parks the next batch write until released.
    #[derive(Default)]
    struct PausingProducts {
        inner: InMemorySellerStore<ProductId, StockRecord>,
        armed: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl PausingProducts {
        fn arm(&self, written: mpsc::Sender<()>, release: mpsc::Receiver<()>) {
            *self.armed.lock().unwrap() = Some((written, release));
        }
    }

    impl SellerStore<ProductId, StockRecord> for PausingProducts {
        fn get(&self, seller_id: SellerId, key: &ProductId) -> Option<StockRecord> {
            self.inner.get(seller_id, key)
        }

        fn list(&self, seller_id: SellerId) -> Vec<StockRecord> {
            self.inner.list(seller_id)
        }

        fn upsert_batch(&self, seller_id: SellerId, entries: Vec<(ProductId, StockRecord)>) {
            self.inner.upsert_batch(seller_id, entries);
            let armed = self.armed.lock().unwrap().take();
            if let Some((written, release)) = armed {
                written.send(()).unwrap();
                release.recv_timeout(Duration::from_secs(2)).unwrap();
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reads_never_observe_a_half_persisted_placement() {
        let products = Arc::new(PausingProducts::default());
        let engine = Arc::new(ReconciliationEngine::new(
            products.clone(),
            InMemorySellerStore::<OrderId, Order>::new(),
            LockPolicy {
                max_wait: Duration::from_millis(50),
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
            },
        ));
        let seller = SellerId::new();
        let p = engine.register_product(seller, fields("Rice", 5, 2, 10)).await.unwrap();

        let (written_tx, written_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        products.arm(written_tx, release_rx);

        let writer = {
            let engine = engine.clone();
            let product_id = p.id_typed();
            tokio::spawn(async move { engine.place_order(seller, vec![line(product_id, 4)]).await })
        };
        tokio::task::spawn_blocking(move || written_rx.recv_timeout(Duration::from_secs(2)))
            .await
            .unwrap()
            .unwrap();

        // Stock is withdrawn but the order line is not stored yet.
        let products_mid_write = engine.list_products(seller).await;
        let items_mid_write = engine.list_items_by_status(seller, LineStatus::Sifting).await;
        release_tx.send(()).unwrap();
        writer.await.unwrap().unwrap();

        assert!(matches!(products_mid_write, Err(EngineError::Busy { .. })));
        assert!(matches!(items_mid_write, Err(EngineError::Busy { .. })));

        let on_hand = engine.get_product(seller, p.id_typed()).await.unwrap().quantity_on_hand();
        let sifting: u64 = engine
            .list_items_by_status(seller, LineStatus::Sifting)
            .await
            .unwrap()
            .iter()
            .map(|i| i.quantity())
            .sum();
        assert_eq!((on_hand, sifting), (6, 4));
    }
}
