use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siftledger_core::{DomainError, DomainResult, Entity, LineItemId, OrderId, SellerId};

use crate::line::{LineStatus, NewLine, OrderLineItem};

/// Command: CompleteSifting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteSifting {
    pub item_id: LineItemId,
    /// `None` completes the whole item in place.
    pub quantity: Option<i64>,
    /// Identity given to the sifted sibling when the item is split.
    pub split_item_id: LineItemId,
    pub occurred_at: DateTime<Utc>,
}

/// What a sifting completion did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiftOutcome {
    /// The item was flipped to sifted in place.
    Completed { item_id: LineItemId },
    /// A sifted sibling was split off. `remaining` is `None` when the original
    /// item was used up and removed.
    Split {
        sifted: LineItemId,
        remaining: Option<LineItemId>,
    },
}

/// A seller's order: line items plus a grand total that always equals their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    seller_id: SellerId,
    items: Vec<OrderLineItem>,
    grand_total: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Open an empty order for a seller.
    pub fn open(id: OrderId, seller_id: SellerId, at: DateTime<Utc>) -> Self {
        Self {
            id,
            seller_id,
            items: Vec::new(),
            grand_total: 0,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn item(&self, item_id: &LineItemId) -> Option<&OrderLineItem> {
        self.items.iter().find(|i| i.id_typed() == *item_id)
    }

    pub fn items_with_status(&self, status: LineStatus) -> impl Iterator<Item = &OrderLineItem> {
        self.items.iter().filter(move |i| i.status() == status)
    }

    /// Append one line item per input, in order.
    ///
    /// Every line is built (and the new total computed) before the order is
    /// touched, so a bad line leaves the order unchanged.
    pub fn append_lines(&mut self, lines: Vec<NewLine>, at: DateTime<Utc>) -> DomainResult<()> {
        if lines.is_empty() {
            return Err(DomainError::validation("products", "at least one product is required"));
        }

        let mut built = Vec::with_capacity(lines.len());
        for line in lines {
            built.push(OrderLineItem::new(line)?);
        }
        let grand_total = sum_totals(self.items.iter().chain(built.iter()))?;

        self.items.extend(built);
        self.grand_total = grand_total;
        self.updated_at = at;
        Ok(())
    }

    /// Complete sifting for one item, fully or by splitting off a sifted portion.
    pub fn complete_sifting(&mut self, cmd: &CompleteSifting) -> DomainResult<SiftOutcome> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id_typed() == cmd.item_id)
            .ok_or_else(|| DomainError::not_found("order item", cmd.item_id))?;

        let item = &self.items[idx];
        if !item.status().is_open() {
            return Err(DomainError::conflict(format!(
                "item {} is not in sifting status (status: {})",
                cmd.item_id,
                item.status().as_str()
            )));
        }

        let outcome = match cmd.quantity {
            None => {
                self.items[idx].mark_sifted();
                SiftOutcome::Completed {
                    item_id: cmd.item_id,
                }
            }
            Some(requested) => {
                if requested <= 0 {
                    return Err(DomainError::validation("quantity", "must be greater than zero"));
                }
                let requested = requested as u64;
                if requested > item.quantity() {
                    return Err(DomainError::conflict(format!(
                        "quantity {requested} exceeds the sifting quantity (remaining: {})",
                        item.quantity()
                    )));
                }

                let sifted = item.split_off(cmd.split_item_id, requested)?;
                self.items[idx].reduce_by(requested);

                let remaining = if self.items[idx].quantity() == 0 {
                    self.items.remove(idx);
                    None
                } else {
                    Some(cmd.item_id)
                };
                self.items.push(sifted);

                SiftOutcome::Split {
                    sifted: cmd.split_item_id,
                    remaining,
                }
            }
        };

        self.grand_total = sum_totals(self.items.iter())?;
        self.updated_at = cmd.occurred_at;
        Ok(outcome)
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn sum_totals<'a>(mut items: impl Iterator<Item = &'a OrderLineItem>) -> DomainResult<u64> {
    items.try_fold(0u64, |acc, i| {
        acc.checked_add(i.total_price())
            .ok_or_else(|| DomainError::validation("grand_total", "order total overflows"))
    })
}
