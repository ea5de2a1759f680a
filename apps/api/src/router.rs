use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1/matching",
            matching_cell::router::matching_routes(state),
        )
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "homevisit-api"
    }))
}
