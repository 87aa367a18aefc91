//! A seller's inventory ledger: every stock record owned by one seller.
//!
//! The ledger is the unit of validation for order placement. A batch of stock
//! requests is checked in full (every product resolves, every summed quantity is
//! on hand) before a single record is touched, so a placement either withdraws
//! everything it asked for or leaves the ledger exactly as it was.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siftledger_core::{DomainError, DomainResult, ProductId, SellerId};

use crate::stock::{ItemType, StockRecord};

/// One requested `(product, quantity)` pair of a placement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: u64,
}

/// A withdrawn line, carrying the snapshots an order line item needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawnLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: u64,
    pub quantity: u64,
}

/// Result of a successful batch withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    /// One entry per request, in request order.
    pub lines: Vec<WithdrawnLine>,
    /// Records whose quantity on hand changed (each product once).
    pub updated: Vec<StockRecord>,
}

/// The stock ledger of one seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryLedger {
    seller_id: SellerId,
    records: Vec<StockRecord>,
}

impl InventoryLedger {
    /// Build a ledger from a seller's persisted records.
    ///
    /// A seller without any registered product has no ledger at all.
    pub fn load(seller_id: SellerId, records: Vec<StockRecord>) -> DomainResult<Self> {
        if records.is_empty() {
            return Err(DomainError::not_found("inventory", seller_id));
        }
        Ok(Self { seller_id, records })
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    pub fn records(&self) -> &[StockRecord] {
        &self.records
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&StockRecord> {
        self.records.iter().find(|r| r.id_typed() == *product_id)
    }

    pub fn of_type(&self, item_type: ItemType) -> Vec<&StockRecord> {
        self.records
            .iter()
            .filter(|r| r.item_type() == item_type)
            .collect()
    }

    pub fn total_on_hand(&self) -> u64 {
        self.records.iter().map(StockRecord::quantity_on_hand).sum()
    }

    /// Check a batch of stock requests without mutating anything.
    ///
    /// Every product must resolve before any quantity is checked, and quantities
    /// are summed per product so repeated lines cannot jointly overdraw stock.
    /// Returns the summed quantity per product, in first-seen order.
    pub fn check(&self, requests: &[StockRequest]) -> DomainResult<Vec<(ProductId, u64)>> {
        if requests.is_empty() {
            return Err(DomainError::validation("products", "at least one product is required"));
        }

        let mut totals: Vec<(ProductId, u64)> = Vec::new();
        let mut index: HashMap<ProductId, usize> = HashMap::new();

        for req in requests {
            if req.quantity == 0 {
                return Err(DomainError::validation("quantity", "must be greater than zero"));
            }
            if self.get(&req.product_id).is_none() {
                return Err(DomainError::not_found("product", req.product_id));
            }
            match index.get(&req.product_id) {
                Some(&i) => {
                    totals[i].1 = totals[i].1.checked_add(req.quantity).ok_or_else(|| {
                        DomainError::validation("quantity", "requested quantity overflows")
                    })?;
                }
                None => {
                    index.insert(req.product_id, totals.len());
                    totals.push((req.product_id, req.quantity));
                }
            }
        }

        for (product_id, requested) in &totals {
            if let Some(record) = self.get(product_id) {
                record.ensure_available(*requested)?;
            }
        }

        Ok(totals)
    }

    /// Validate the whole batch, then withdraw every requested quantity.
    pub fn withdraw(
        &mut self,
        requests: &[StockRequest],
        at: DateTime<Utc>,
    ) -> DomainResult<Withdrawal> {
        let totals = self.check(requests)?;

        let mut lines = Vec::with_capacity(requests.len());
        for req in requests {
            if let Some(record) = self.get(&req.product_id) {
                lines.push(WithdrawnLine {
                    product_id: req.product_id,
                    product_name: record.name().to_string(),
                    unit_price: record.selling_price(),
                    quantity: req.quantity,
                });
            }
        }

        let mut updated = Vec::with_capacity(totals.len());
        for (product_id, quantity) in totals {
            if let Some(record) = self.records.iter_mut().find(|r| r.id_typed() == product_id) {
                record.withdraw(quantity, at);
                updated.push(record.clone());
            }
        }

        Ok(Withdrawal { lines, updated })
    }
}
