use std::sync::Arc;

use axum::{extract::State, http::header::AUTHORIZATION, middleware::Next, response::Response};
use chrono::Utc;

use siftledger_auth::{AuthError, JwtValidator, resolve_caller};

use crate::app::errors;
use crate::context::SellerContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Resolve the calling seller before any handler runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(v) => match v.to_str() {
            Ok(s) => Some(s),
            Err(_) => return errors::auth_error_to_response(AuthError::MalformedCredential),
        },
    };

    let seller_id = match resolve_caller(state.jwt.as_ref(), header, Utc::now()) {
        Ok(id) => id,
        Err(e) => return errors::auth_error_to_response(e),
    };

    req.extensions_mut().insert(SellerContext::new(seller_id));
    next.run(req).await
}
