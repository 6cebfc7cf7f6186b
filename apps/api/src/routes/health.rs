use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness only; does not touch the store or the compiler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
