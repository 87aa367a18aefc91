use core::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};

use siftledger_core::{DomainError, ProductId};
use siftledger_infra::{OrderRequestLine, ProductFields};
use siftledger_inventory::{ItemType, StockRecord};
use siftledger_orders::{LineStatus, Order, OrderLineItem};

// -------------------------
// Request DTOs
// -------------------------
//
// Fields are optional at the JSON level so that a missing field is reported as
// a validation error naming it, rather than as a body rejection.

#[derive(Debug, Default, Deserialize)]
pub struct RegisterProductRequest {
    pub name: Option<String>,
    pub selling_price: Option<i64>,
    pub cost_price: Option<i64>,
    pub quantity: Option<i64>,
    pub item_type: Option<String>,
    pub product_type: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl RegisterProductRequest {
    pub fn into_fields(self) -> Result<ProductFields, DomainError> {
        Ok(ProductFields {
            name: required("name", self.name)?,
            selling_price: required("selling_price", self.selling_price)?,
            cost_price: required("cost_price", self.cost_price)?,
            quantity: required("quantity", self.quantity)?,
            item_type: required("item_type", self.item_type)?.parse()?,
            product_type: required("product_type", self.product_type)?,
            category: required("category", self.category)?,
            image: required("image", self.image)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub additional_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub products: Option<Vec<OrderLineRequest>>,
}

impl PlaceOrderRequest {
    pub fn into_lines(self) -> Result<Vec<OrderRequestLine>, DomainError> {
        required("products", self.products)?
            .into_iter()
            .map(|line| {
                Ok(OrderRequestLine {
                    product_id: parse_id::<ProductId>(&required("product_id", line.product_id)?)?,
                    quantity: required("quantity", line.quantity)?,
                    status: line.status.as_deref().map(LineStatus::from_str).transpose()?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteSiftingRequest {
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub item_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemsQuery {
    pub status: Option<String>,
}

pub fn required<T>(field: &str, value: Option<T>) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::validation(field, "is required"))
}

pub fn parse_id<T>(raw: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim().parse()
}

pub fn parse_item_type(raw: &str) -> Result<ItemType, DomainError> {
    raw.parse()
}

// -------------------------
// Response mapping
// -------------------------

pub fn product_to_json(r: &StockRecord) -> Value {
    json!({
        "id": r.id_typed().to_string(),
        "name": r.name(),
        "selling_price": r.selling_price(),
        "cost_price": r.cost_price(),
        "quantity": r.quantity_on_hand(),
        "item_type": r.item_type().as_str(),
        "product_type": r.product_type(),
        "category": r.category(),
        "image": r.image(),
        "created_at": r.created_at().to_rfc3339(),
        "updated_at": r.updated_at().to_rfc3339(),
    })
}

pub fn item_to_json(i: &OrderLineItem) -> Value {
    json!({
        "id": i.id_typed().to_string(),
        "product_id": i.product_id().to_string(),
        "product_name": i.product_name(),
        "quantity": i.quantity(),
        "unit_price": i.unit_price(),
        "total_price": i.total_price(),
        "status": i.status().as_str(),
    })
}

/// Order with its items in line order plus the display partition by status.
pub fn order_to_json(o: &Order) -> Value {
    let partition = |status| {
        o.items_with_status(status)
            .map(item_to_json)
            .collect::<Vec<_>>()
    };

    json!({
        "id": o.id_typed().to_string(),
        "items": o.items().iter().map(item_to_json).collect::<Vec<_>>(),
        "sifting_items": partition(LineStatus::Sifting),
        "sifted_items": partition(LineStatus::Sifted),
        "grand_total": o.grand_total(),
        "created_at": o.created_at().to_rfc3339(),
        "updated_at": o.updated_at().to_rfc3339(),
    })
}
