use core::str::FromStr;

use serde::{Deserialize, Serialize};

use siftledger_core::validate::line_total;
use siftledger_core::{DomainError, DomainResult, Entity, LineItemId, ProductId};

/// Fulfillment status of a line item.
///
/// Status only ever moves forward: `sifting` → `sifted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    #[default]
    Sifting,
    Sifted,
}

impl LineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStatus::Sifting => "sifting",
            LineStatus::Sifted => "sifted",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, LineStatus::Sifting)
    }
}

impl FromStr for LineStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sifting" => Ok(LineStatus::Sifting),
            "sifted" => Ok(LineStatus::Sifted),
            _ => Err(DomainError::validation("status", "must be one of: sifting, sifted")),
        }
    }
}

/// Input for one line item appended on placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub item_id: LineItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: u64,
    pub status: LineStatus,
}

/// One line of an order.
///
/// `product_id` is a lookup reference into the seller's inventory; the name and
/// unit price are snapshots taken when the line was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    id: LineItemId,
    product_id: ProductId,
    product_name: String,
    quantity: u64,
    unit_price: u64,
    total_price: u64,
    status: LineStatus,
}

impl OrderLineItem {
    pub fn new(line: NewLine) -> DomainResult<Self> {
        if line.quantity == 0 {
            return Err(DomainError::validation("quantity", "must be greater than zero"));
        }
        let total_price = line_total("total_price", line.quantity, line.unit_price)?;
        Ok(Self {
            id: line.item_id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price,
            status: line.status,
        })
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn total_price(&self) -> u64 {
        self.total_price
    }

    pub fn status(&self) -> LineStatus {
        self.status
    }

    /// Sibling with the same product and price snapshot, already sifted.
    pub(crate) fn split_off(&self, item_id: LineItemId, quantity: u64) -> DomainResult<Self> {
        Self::new(NewLine {
            item_id,
            product_id: self.product_id,
            product_name: self.product_name.clone(),
            quantity,
            unit_price: self.unit_price,
            status: LineStatus::Sifted,
        })
    }

    /// Shrink the remaining quantity; total is recomputed from the snapshot price.
    pub(crate) fn reduce_by(&mut self, quantity: u64) {
        self.quantity = self.quantity.saturating_sub(quantity);
        // Cannot overflow: the product was representable at the larger quantity.
        self.total_price = self.quantity * self.unit_price;
    }

    pub(crate) fn mark_sifted(&mut self) {
        self.status = LineStatus::Sifted;
    }
}

impl Entity for OrderLineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
