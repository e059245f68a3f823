use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Status of a translation job in its lifecycle.
///
/// `Pending -> Processing -> {Completed | Failed}` is the only legal path;
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Machine-checkable classification of why a job (or request) failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobErrorKind {
    InvalidInput,
    NotFound,
    CapabilityUnavailable,
    CapabilityFailure,
    Timeout,
    CacheCorruption,
}

/// Terminal error recorded on a failed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobError {
    pub kind: JobErrorKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything a completed job produced.
///
/// SRT payloads are carried inline (the API returns them directly); the
/// locator strings point at artifacts placed through the [`ArtifactStore`]
/// capability and resolve under `/files/`.
///
/// [`ArtifactStore`]: crate::services::storage::ArtifactStore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
    pub transcript: String,
    pub original_srt: String,
    pub translated_srt: String,
    pub video_locator: Option<String>,
    pub original_srt_locator: Option<String>,
    pub translated_srt_locator: Option<String>,
    pub rendered_locator: Option<String>,
}

impl JobOutput {
    /// Integrity check for values read back from the job-result cache.
    /// A cached output with empty payloads is treated as corrupt.
    pub fn is_intact(&self) -> bool {
        !self.transcript.trim().is_empty()
            && !self.original_srt.trim().is_empty()
            && !self.translated_srt.trim().is_empty()
    }
}

/// A tracked unit of submitted work spanning the full media pipeline.
///
/// Mutated exclusively through the transition methods below, and only by the
/// worker that owns the job. Pollers receive cloned snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub id: Uuid,
    pub status: JobStatus,
    /// 0-100, monotonically non-decreasing while `Processing`. Fixed at 100 on
    /// `Completed`; keeps its last known value on `Failed`.
    pub progress: u8,
    pub message: String,
    pub video_filename: String,
    pub target_language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<JobOutput>,
    pub error: Option<JobError>,
}

impl TranslationJob {
    pub fn new(video_filename: String, target_language: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            progress: 0,
            message: "Job created, waiting to start".to_string(),
            video_filename,
            target_language,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    /// Move to `Processing` and report progress. Progress never regresses.
    /// Returns false (without mutating) if the job is already terminal.
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Processing;
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
        self.updated_at = Utc::now();
        true
    }

    /// Terminal success transition. Rejected if already terminal.
    pub fn complete(&mut self, output: JobOutput) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.message = "Completed".to_string();
        self.result = Some(output);
        self.error = None;
        self.updated_at = Utc::now();
        true
    }

    /// Terminal failure transition. Rejected if already terminal.
    /// Progress intentionally keeps its last known value.
    pub fn fail(&mut self, error: JobError) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.message = format!("Failed: {}", error.message);
        self.error = Some(error);
        self.result = None;
        self.updated_at = Utc::now();
        true
    }
}

/// Compact view of a job for the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub video_filename: String,
    pub target_language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TranslationJob> for JobSummary {
    fn from(job: &TranslationJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            progress: job.progress,
            video_filename: job.video_filename.clone(),
            target_language: job.target_language.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_output() -> JobOutput {
        JobOutput {
            transcript: "hello world".to_string(),
            original_srt: "1\n00:00:00,000 --> 00:00:01,000\nhello world\n".to_string(),
            translated_srt: "1\n00:00:00,000 --> 00:00:01,000\nhalo dunia\n".to_string(),
            video_locator: None,
            original_srt_locator: None,
            translated_srt_locator: None,
            rendered_locator: None,
        }
    }

    fn sample_job() -> TranslationJob {
        TranslationJob::new("clip.mp4".to_string(), "id".to_string())
    }

    #[test]
    fn happy_path_transitions() {
        let mut job = sample_job();
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.advance(20, "Audio extracted"));
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 20);
        assert!(job.complete(sample_output()));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.result.is_some());
        assert!(job.error.is_none());
    }

    #[test]
    fn progress_is_monotonic() {
        let mut job = sample_job();
        job.advance(45, "Transcribed");
        job.advance(20, "stale checkpoint");
        assert_eq!(job.progress, 45);
        job.advance(60, "Original subtitles built");
        assert_eq!(job.progress, 60);
    }

    #[test]
    fn terminal_states_absorb_mutations() {
        let mut job = sample_job();
        job.advance(85, "Translating");
        assert!(job.fail(JobError::new(
            JobErrorKind::CapabilityFailure,
            "provider error"
        )));
        assert!(!job.advance(90, "late checkpoint"));
        assert!(!job.complete(sample_output()));
        assert!(!job.fail(JobError::new(JobErrorKind::Timeout, "late timeout")));
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 85, "failed job keeps last known progress");
        assert!(job.result.is_none());
        assert_eq!(
            job.error.as_ref().unwrap().kind,
            JobErrorKind::CapabilityFailure
        );
    }

    #[test]
    fn completed_job_rejects_failure() {
        let mut job = sample_job();
        job.advance(95, "Rendering");
        assert!(job.complete(sample_output()));
        assert!(!job.fail(JobError::new(JobErrorKind::Timeout, "too late")));
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());
    }

    /// Exhaustively enumerate mutation sequences and check that only the legal
    /// edges are ever taken and exactly one of result/error is set once
    /// terminal.
    #[test]
    fn transition_sequences_stay_on_legal_edges() {
        #[derive(Clone, Copy)]
        enum Op {
            Advance(u8),
            Complete,
            Fail,
        }
        let ops = [Op::Advance(30), Op::Advance(70), Op::Complete, Op::Fail];

        // All sequences of length 4 over the op alphabet.
        for a in 0..ops.len() {
            for b in 0..ops.len() {
                for c in 0..ops.len() {
                    for d in 0..ops.len() {
                        let mut job = sample_job();
                        let mut last_progress = 0u8;
                        for op in [ops[a], ops[b], ops[c], ops[d]] {
                            let was_terminal = job.status.is_terminal();
                            let applied = match op {
                                Op::Advance(p) => job.advance(p, "step"),
                                Op::Complete => job.complete(sample_output()),
                                Op::Fail => job
                                    .fail(JobError::new(JobErrorKind::CapabilityFailure, "boom")),
                            };
                            assert_eq!(applied, !was_terminal);
                            if was_terminal {
                                continue;
                            }
                            assert!(job.progress >= last_progress);
                            last_progress = job.progress;
                        }
                        if job.status.is_terminal() {
                            assert_ne!(job.result.is_some(), job.error.is_some());
                        } else {
                            assert!(job.result.is_none() && job.error.is_none());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn summary_mirrors_job_fields() {
        let mut job = sample_job();
        job.advance(45, "Transcribed");
        let summary = JobSummary::from(&job);
        assert_eq!(summary.id, job.id);
        assert_eq!(summary.status, JobStatus::Processing);
        assert_eq!(summary.progress, 45);
    }
}
