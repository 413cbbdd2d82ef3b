use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, audio, tts, voices};
use crate::state::AppState;

/// Routes under `/api`.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tts", post(tts::tts_handler))
        .route("/voices", get(voices::list_voices))
}

/// The complete application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/audio/{id}", get(audio::download_audio))
        .nest("/api", create_api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
