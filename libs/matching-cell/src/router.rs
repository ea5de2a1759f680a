use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn matching_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/search", post(handlers::search_available_therapists))
        .route("/series-search", post(handlers::search_for_series))
        .with_state(state)
}
