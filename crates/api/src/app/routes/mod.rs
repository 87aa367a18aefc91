use axum::{Router, routing::get};

pub mod orders;
pub mod products;
pub mod summary;
pub mod system;

/// Router for all authenticated (seller-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/health", get(system::api_health))
        .route("/summary", get(summary::get_summary))
        .nest("/products", products::router())
        .nest("/orders", orders::router())
}
