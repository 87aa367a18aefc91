use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use siftledger_core::{DomainError, LineItemId, OrderId};
use siftledger_orders::LineStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::SellerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/items", get(list_items))
        .route("/:order_id/items/:item_id", get(get_order_item))
        .route("/:order_id/items/:item_id/complete", post(complete_sifting))
}

fn parse_path(order_id: &str, item_id: &str) -> Result<(OrderId, LineItemId), DomainError> {
    Ok((dto::parse_id(order_id)?, dto::parse_id(item_id)?))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    body: Result<Json<dto::PlaceOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let lines = match body.into_lines() {
        Ok(l) => l,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.engine.place_order(seller.seller_id(), lines).await {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
) -> axum::response::Response {
    let orders = match services.engine.list_orders(seller.seller_id()).await {
        Ok(o) => o,
        Err(e) => return errors::engine_error_to_response(e),
    };
    let items = orders.iter().map(dto::order_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// Line items across all orders with `?status=sifting` (default) or `?status=sifted`.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    Query(query): Query<dto::ItemsQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref().map(str::parse::<LineStatus>).transpose() {
        Ok(s) => s.unwrap_or_default(),
        Err(e) => return errors::domain_error_to_response(e),
    };

    let listed = match services
        .engine
        .list_items_by_status(seller.seller_id(), status)
        .await
    {
        Ok(l) => l,
        Err(e) => return errors::engine_error_to_response(e),
    };
    let items = listed.iter().map(dto::item_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    Path((order_id, item_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (order_id, item_id) = match parse_path(&order_id, &item_id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .engine
        .get_order_item(seller.seller_id(), order_id, item_id)
        .await
    {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Completes the whole item, or `{"quantity": n}` of it. The body is optional.
pub async fn complete_sifting(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    Path((order_id, item_id)): Path<(String, String)>,
    body: Bytes,
) -> axum::response::Response {
    let (order_id, item_id) = match parse_path(&order_id, &item_id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        dto::CompleteSiftingRequest::default()
    } else {
        match serde_json::from_slice::<dto::CompleteSiftingRequest>(&body) {
            Ok(r) => r,
            Err(e) => {
                return errors::domain_error_to_response(DomainError::validation(
                    "quantity",
                    format!("invalid request body: {e}"),
                ));
            }
        }
    };

    match services
        .engine
        .complete_sifting(seller.seller_id(), order_id, item_id, request.quantity)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
