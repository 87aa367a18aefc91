use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use siftledger_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::SellerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(register_product).get(list_products))
        .route("/:product_id", get(get_product))
        .route("/:product_id/restock", post(restock))
}

pub async fn register_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    body: Result<Json<dto::RegisterProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let fields = match body.into_fields() {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.engine.register_product(seller.seller_id(), fields).await {
        Ok(record) => (StatusCode::CREATED, Json(dto::product_to_json(&record))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// All products, or only one unit classification with `?item_type=`.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    Query(query): Query<dto::ProductsQuery>,
) -> axum::response::Response {
    let listed = match query.item_type.as_deref() {
        None => services.engine.list_products(seller.seller_id()).await,
        Some(raw) => match dto::parse_item_type(raw) {
            Ok(item_type) => {
                services
                    .engine
                    .list_products_by_type(seller.seller_id(), item_type)
                    .await
            }
            Err(e) => return errors::domain_error_to_response(e),
        },
    };
    let records = match listed {
        Ok(r) => r,
        Err(e) => return errors::engine_error_to_response(e),
    };

    let items = records.iter().map(dto::product_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match dto::parse_id(&product_id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.engine.get_product(seller.seller_id(), product_id).await {
        Ok(record) => (StatusCode::OK, Json(dto::product_to_json(&record))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn restock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
    Path(product_id): Path<String>,
    body: Result<Json<dto::RestockRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let parsed = dto::parse_id::<ProductId>(&product_id).and_then(|id| {
        dto::required("additional_quantity", body.additional_quantity).map(|q| (id, q))
    });
    let (product_id, additional) = match parsed {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .engine
        .restock(seller.seller_id(), product_id, additional)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::product_to_json(&record))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
