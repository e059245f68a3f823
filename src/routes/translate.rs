use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::models::api::{
    ApiError, CacheStatsResponse, JobStatusResponse, SubmitRequest, SubmitResponse,
};
use crate::models::job::JobSummary;
use crate::services::jobs::{JobDescriptor, SubmitError};

fn api_error(status: StatusCode, kind: &str, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            kind: kind.to_string(),
            message: message.into(),
        }),
    )
}

/// POST /api/v1/translate — upload a video for transcription and subtitle
/// translation. Responds immediately with a pollable job id.
pub async fn submit_translation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, Json<ApiError>)> {
    let mut video: Option<(String, Vec<u8>)> = None;
    let mut request = SubmitRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "invalid_input", e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("video") => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "upload.mp4".to_string());
                let data = field.bytes().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, "invalid_input", e.to_string())
                })?;
                video = Some((filename, data.to_vec()));
            }
            Some("target_language") => {
                request.target_language = field.text().await.map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, "invalid_input", e.to_string())
                })?;
            }
            _ => {}
        }
    }

    let (filename, data) = video.ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "multipart field 'video' is required",
        )
    })?;

    if data.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "uploaded video is empty",
        ));
    }

    request.validate().map_err(|e| {
        api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_input",
            format!("invalid target_language: {e}"),
        )
    })?;

    // Persist the upload before handing it to the worker.
    let upload_dir = std::path::Path::new(&state.config.upload_dir);
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
    })?;
    let video_path = upload_dir.join(format!("{}_{}", Uuid::new_v4().simple(), filename));
    tokio::fs::write(&video_path, &data).await.map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
    })?;

    let job_id = state
        .jobs
        .submit(JobDescriptor {
            video_path,
            video_filename: filename,
            target_language: request.target_language,
        })
        .map_err(|e| match e {
            SubmitError::InvalidInput(msg) => {
                api_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", msg)
            }
        })?;

    let job = state.jobs.get(job_id);
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            status: job.map(|j| j.status).unwrap_or(crate::models::job::JobStatus::Pending),
            message: "Video submitted for processing".to_string(),
        }),
    ))
}

/// GET /api/v1/translate/{job_id} — poll one job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, (StatusCode, Json<ApiError>)> {
    let job = state.jobs.get(job_id).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("unknown job: {job_id}"),
        )
    })?;

    Ok(Json(JobStatusResponse {
        job_id: job.id,
        status: job.status,
        progress: job.progress,
        message: job.message,
        video_filename: job.video_filename,
        target_language: job.target_language,
        result: job.result,
        error: job.error,
    }))
}

/// GET /api/v1/jobs — all jobs, newest first. Monitoring only.
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.jobs.list())
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        job_results: state.job_cache.stats(),
        segments: state.segment_cache.stats(),
    })
}

/// DELETE /api/v1/cache — clear both cache scopes.
pub async fn cache_clear(State(state): State<AppState>) -> StatusCode {
    state.job_cache.clear();
    state.segment_cache.clear();
    tracing::info!("Caches cleared");
    StatusCode::NO_CONTENT
}

/// Keep only the final path component of a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    let name = raw.replace('\\', "/");
    let name = name.rsplit('/').next().unwrap_or("upload.mp4");
    if name.is_empty() {
        "upload.mp4".to_string()
    } else {
        name.to_string()
    }
}
