use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use siftledger_core::validate::{non_blank, non_negative, positive};
use siftledger_core::{DomainError, DomainResult, Entity, ProductId, SellerId};

/// Unit classification of a product: sold one by one, or as a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    #[serde(rename = "singleitem")]
    SingleItem,
    #[serde(rename = "groupitems")]
    GroupItem,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::SingleItem => "singleitem",
            ItemType::GroupItem => "groupitems",
        }
    }
}

impl FromStr for ItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singleitem" => Ok(ItemType::SingleItem),
            "groupitems" => Ok(ItemType::GroupItem),
            _ => Err(DomainError::validation(
                "item_type",
                "must be one of: singleitem, groupitems",
            )),
        }
    }
}

/// Command: RegisterStock.
///
/// Numeric fields are signed so that non-positive input is reported as a
/// validation failure on the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterStock {
    pub seller_id: SellerId,
    pub product_id: ProductId,
    pub name: String,
    /// Selling price in smallest currency unit.
    pub selling_price: i64,
    /// Cost price in smallest currency unit.
    pub cost_price: i64,
    pub quantity: i64,
    pub item_type: ItemType,
    pub product_type: String,
    pub category: String,
    pub image: String,
    pub occurred_at: DateTime<Utc>,
}

/// A single product's inventory entry for one seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    id: ProductId,
    seller_id: SellerId,
    name: String,
    selling_price: u64,
    cost_price: u64,
    quantity_on_hand: u64,
    item_type: ItemType,
    product_type: String,
    category: String,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Validate a registration command and build the new record.
    pub fn register(cmd: &RegisterStock) -> DomainResult<Self> {
        non_blank("name", &cmd.name)?;
        let selling_price = positive("selling_price", cmd.selling_price)?;
        let cost_price = positive("cost_price", cmd.cost_price)?;
        let quantity_on_hand = non_negative("quantity", cmd.quantity)?;
        non_blank("product_type", &cmd.product_type)?;
        non_blank("category", &cmd.category)?;
        non_blank("image", &cmd.image)?;

        Ok(Self {
            id: cmd.product_id,
            seller_id: cmd.seller_id,
            name: cmd.name.trim().to_string(),
            selling_price,
            cost_price,
            quantity_on_hand,
            item_type: cmd.item_type,
            product_type: cmd.product_type.trim().to_string(),
            category: cmd.category.trim().to_string(),
            image: cmd.image.trim().to_string(),
            created_at: cmd.occurred_at,
            updated_at: cmd.occurred_at,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selling_price(&self) -> u64 {
        self.selling_price
    }

    pub fn cost_price(&self) -> u64 {
        self.cost_price
    }

    pub fn quantity_on_hand(&self) -> u64 {
        self.quantity_on_hand
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn product_type(&self) -> &str {
        &self.product_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add units to the quantity on hand. Open orders are not touched.
    pub fn restock(&mut self, additional: i64, at: DateTime<Utc>) -> DomainResult<()> {
        let additional = positive("additional_quantity", additional)?;
        self.quantity_on_hand = self
            .quantity_on_hand
            .checked_add(additional)
            .ok_or_else(|| DomainError::validation("additional_quantity", "stock level overflows"))?;
        self.updated_at = at;
        Ok(())
    }

    pub(crate) fn ensure_available(&self, requested: u64) -> DomainResult<()> {
        if requested > self.quantity_on_hand {
            return Err(DomainError::InsufficientStock {
                product_id: self.id.to_string(),
                product_name: self.name.clone(),
                available: self.quantity_on_hand,
                requested,
            });
        }
        Ok(())
    }

    /// Callers must have checked availability first.
    pub(crate) fn withdraw(&mut self, quantity: u64, at: DateTime<Utc>) {
        self.quantity_on_hand -= quantity;
        self.updated_at = at;
    }
}

impl Entity for StockRecord {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
