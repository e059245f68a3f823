use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::job::JobOutput;
use crate::services::cache::LruStore;
use crate::services::jobs::JobManager;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jobs: Arc<JobManager>,
    pub job_cache: Arc<LruStore<JobOutput>>,
    pub segment_cache: Arc<LruStore<String>>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        jobs: Arc<JobManager>,
        job_cache: Arc<LruStore<JobOutput>>,
        segment_cache: Arc<LruStore<String>>,
    ) -> Self {
        Self {
            config,
            jobs,
            job_cache,
            segment_cache,
        }
    }
}
