use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

use crate::delivery::GenerateRequest;
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::{ArtifactId, StoreError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub download_url: String,
    pub file_name: String,
    pub page_count: usize,
    pub expires_in_seconds: u64,
    pub expires_at: DateTime<Utc>,
    pub message: &'static str,
}

pub fn download_url(id: &ArtifactId) -> String {
    format!("/api/resume/download/{id}")
}

/// POST /api/resume/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;

    let generated = state.pipeline.generate(request).await?;
    let handle = generated.handle;

    Ok(Json(GenerateResponse {
        success: true,
        download_url: download_url(&handle.id),
        file_name: handle.file_name,
        page_count: generated.page_count,
        expires_in_seconds: handle.ttl.as_secs(),
        expires_at: handle.expires_at,
        message: "Resume generated successfully",
    }))
}

/// GET /api/resume/download/:id
/// Served any number of times until the lease ends; never extends it.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = ArtifactId::parse(&raw_id).ok_or_else(|| {
        debug!("Rejected malformed artifact id");
        AppError::NotFound("File not found".to_string())
    })?;

    let artifact = state.store.get(&id).await.map_err(|e| {
        if !matches!(e, StoreError::NotFound) {
            error!(artifact = %id, "Download failed: {e}");
        }
        AppError::from(e)
    })?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        artifact.bytes,
    )
        .into_response())
}
