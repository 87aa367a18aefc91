use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};
use serde_json::json;

use crate::app::services::AppServices;
use crate::context::SellerContext;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "running" }))
}

pub async fn api_health(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "store": services.store_kind(),
        "seller_id": seller.seller_id().to_string(),
    }))
}

pub async fn whoami(Extension(seller): Extension<SellerContext>) -> impl IntoResponse {
    Json(json!({ "seller_id": seller.seller_id().to_string() }))
}
