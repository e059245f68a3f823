use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{JobError, JobOutput, JobStatus};
use crate::services::cache::CacheStats;

/// Metadata fields of a translation submission (the file itself arrives as a
/// separate multipart part).
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRequest {
    /// ISO 639 language code for the subtitle translation, e.g. "id", "en".
    #[garde(length(min = 2, max = 8), ascii)]
    pub target_language: String,
}

impl Default for SubmitRequest {
    fn default() -> Self {
        // Same default target language as the upstream service.
        Self {
            target_language: "id".to_string(),
        }
    }
}

/// Response after submitting a video for processing.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

/// Full job snapshot returned when polling a job.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub video_filename: String,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

/// Combined statistics for both cache scopes.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub job_results: CacheStats,
    pub segments: CacheStats,
}

/// Machine-readable error body for synchronous request failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
}
