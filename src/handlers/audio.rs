use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Streams a rendered artifact by id.
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    debug!("Audio download requested - id={}", id);

    let (meta, path) = state.service.artifact(&id).await?;
    let read_err = |e: std::io::Error| {
        AppError::internal(format!("Failed to read artifact {}: {e}", meta.id))
    };
    let file = tokio::fs::File::open(&path).await.map_err(read_err)?;
    let length = file.metadata().await.map_err(read_err)?.len();

    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", meta.file_name))
        .map_err(|e| AppError::internal(format!("Invalid file name {}: {e}", meta.file_name)))?;

    info!("Serving {} ({} bytes)", meta.file_name, length);

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(meta.format.content_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
