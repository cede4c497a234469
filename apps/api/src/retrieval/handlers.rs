use std::path::PathBuf;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::retrieval::resume_index::IngestSummary;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    /// Defaults to `RESUME_FOLDER`.
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct ResumeTextResponse {
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub count: u64,
}

/// POST /api/v1/resumes/ingest
pub async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestSummary>, AppError> {
    let folder = PathBuf::from(req.folder.unwrap_or_else(|| state.config.resume_folder.clone()));
    let summary = state.resume_index.ingest_folder(&folder).await?;
    Ok(Json(summary))
}

/// POST /api/v1/resumes/upload (multipart, one `file` field)
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read {filename}: {e}")))?;

        state.resume_index.ingest_document(&filename, &data).await?;
        let count = state.resume_index.count().await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { filename, count })));
    }

    Err(AppError::Validation(
        "multipart body must contain a file field".to_string(),
    ))
}

/// GET /api/v1/resumes/count
pub async fn handle_count(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.resume_index.count().await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/v1/resumes/:filename
pub async fn handle_get_text(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ResumeTextResponse>, AppError> {
    let text = state
        .resume_index
        .get_resume_text(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume not found: {filename}")))?;
    Ok(Json(ResumeTextResponse { filename, text }))
}

/// DELETE /api/v1/resumes
pub async fn handle_clear(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.resume_index.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
