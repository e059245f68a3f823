pub mod cache;
pub mod fingerprint;
pub mod jobs;
pub mod media;
pub mod pipeline;
pub mod storage;
pub mod subtitles;
pub mod transcriber;
pub mod translation;

use std::time::Duration;

use crate::models::job::{JobError, JobErrorKind};

/// Error shared by every external capability (transcription, translation,
/// media tooling). Pipeline stages map these onto the job's terminal error.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// A required external tool or model is missing entirely.
    #[error("{0}")]
    Unavailable(String),

    /// The capability was invoked but the call failed.
    #[error("{0}")]
    Failed(String),

    /// The call exceeded its configured bound.
    #[error("capability call exceeded {}s", .0.as_secs())]
    Timeout(Duration),

    /// The input handed to the capability was malformed. Never retried.
    #[error("{0}")]
    InvalidInput(String),
}

impl CapabilityError {
    /// Transient failures worth another attempt. Missing tools and malformed
    /// input will not improve with retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CapabilityError::Failed(_) | CapabilityError::Timeout(_))
    }

    pub fn kind(&self) -> JobErrorKind {
        match self {
            CapabilityError::Unavailable(_) => JobErrorKind::CapabilityUnavailable,
            CapabilityError::Failed(_) => JobErrorKind::CapabilityFailure,
            CapabilityError::Timeout(_) => JobErrorKind::Timeout,
            CapabilityError::InvalidInput(_) => JobErrorKind::InvalidInput,
        }
    }
}

impl From<CapabilityError> for JobError {
    fn from(err: CapabilityError) -> Self {
        JobError::new(err.kind(), err.to_string())
    }
}
