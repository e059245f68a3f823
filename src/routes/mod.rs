pub mod health;
pub mod metrics;
pub mod translate;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::app_state::AppState;

/// API routes over the shared state. The metrics route is attached in `main`
/// because it carries its own Prometheus handle state.
pub fn router(state: AppState) -> Router {
    let files = ServeDir::new(&state.config.output_dir);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/translate", post(translate::submit_translation))
        .route("/api/v1/translate/{job_id}", get(translate::get_job_status))
        .route("/api/v1/jobs", get(translate::list_jobs))
        .route("/api/v1/cache/stats", get(translate::cache_stats))
        .route("/api/v1/cache", delete(translate::cache_clear))
        .nest_service("/files", files)
        .layer(body_limit)
        .with_state(state)
}
