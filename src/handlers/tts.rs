use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::core::format::AudioFormat;
use crate::core::service::ScriptRequest;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Rendering request body
#[derive(Debug, Clone, Deserialize)]
pub struct TtsRequest {
    /// Annotated text, may contain `[[...]]` directives
    pub text: String,
    pub voice: Option<String>,
    pub lang: Option<String>,
    pub rate: Option<f64>,
    pub pitch: Option<f64>,
    /// `mp3` (default) or `wav`
    pub format: Option<AudioFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    pub id: String,
    pub audio_url: String,
    pub format: AudioFormat,
    pub bytes: u64,
    pub duration_sec: Option<f64>,
    pub cached: bool,
}

/// Renders annotated text, answering from the cache for identical input.
pub async fn tts_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> AppResult<Json<TtsResponse>> {
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;

    let outcome = state
        .service
        .synthesize(ScriptRequest {
            text: body.text,
            lang: body.lang,
            voice: body.voice,
            rate: body.rate,
            pitch: body.pitch,
            format: body.format,
        })
        .await?;

    info!(
        "TTS request {} served (cached={}, {} bytes)",
        outcome.id, outcome.cached, outcome.bytes
    );

    Ok(Json(TtsResponse {
        audio_url: format!("/audio/{}", outcome.id),
        id: outcome.id,
        format: outcome.format,
        bytes: outcome.bytes,
        duration_sec: outcome.duration_sec,
        cached: outcome.cached,
    }))
}
