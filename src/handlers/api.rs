use axum::{extract::State, response::Json};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

/// Health check handler
///
/// Reports the active provider and the cache counters.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let store = state.service.store();
    let (hits, misses) = store.metrics().get_stats();

    Json(json!({
        "status": "OK",
        "provider": state.service.provider_name(),
        "cache": {
            "backend": store.backend_type(),
            "hits": hits,
            "misses": misses,
        }
    }))
}
