use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SellerContext;

pub async fn get_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(seller): Extension<SellerContext>,
) -> axum::response::Response {
    match services.engine.summary(seller.seller_id()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
