//! Job registry and worker scheduling.
//!
//! One explicitly constructed manager owns every job record. Submission
//! registers a `Pending` job and hands it to a worker task gated by a
//! bounded semaphore; the worker is the record's single writer, so pollers
//! only ever take cheap snapshot clones under a short-lived read lock.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::models::job::{JobError, JobErrorKind, JobOutput, JobSummary, TranslationJob};
use crate::services::pipeline::PipelineRunner;

/// Input descriptor for one submission. The stored upload path is internal;
/// only the original filename and language appear on the job record.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub video_path: PathBuf,
    pub video_filename: String,
    pub target_language: String,
}

/// Synchronous submission failure; the job is never created.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("{0}")]
    InvalidInput(String),
}

pub struct JobManager {
    jobs: RwLock<HashMap<Uuid, TranslationJob>>,
    pipeline: Arc<PipelineRunner>,
    /// Bounds simultaneously active workers; transcription and rendering are
    /// memory and CPU heavy.
    permits: Arc<Semaphore>,
}

impl JobManager {
    pub fn new(pipeline: Arc<PipelineRunner>, max_concurrent_jobs: usize) -> Arc<Self> {
        Arc::new(Self {
            jobs: RwLock::new(HashMap::new()),
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        })
    }

    /// Create a `Pending` job and schedule its pipeline on a worker task.
    /// Returns the job id immediately; never blocks on pipeline work.
    pub fn submit(self: &Arc<Self>, descriptor: JobDescriptor) -> Result<Uuid, SubmitError> {
        if descriptor.video_filename.trim().is_empty() {
            return Err(SubmitError::InvalidInput(
                "submission is missing a video filename".to_string(),
            ));
        }
        if descriptor.target_language.trim().is_empty() {
            return Err(SubmitError::InvalidInput(
                "submission is missing a target language".to_string(),
            ));
        }

        let job = TranslationJob::new(
            descriptor.video_filename.clone(),
            descriptor.target_language.clone(),
        );
        let job_id = job.id;
        self.jobs.write().insert(job_id, job);
        metrics::counter!("translation_jobs_total").increment(1);

        tracing::info!(
            job_id = %job_id,
            filename = %descriptor.video_filename,
            language = %descriptor.target_language,
            "Job submitted"
        );

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let permit = match Arc::clone(&manager.permits).acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    manager.fail(
                        job_id,
                        JobError::new(JobErrorKind::CapabilityFailure, "worker pool shut down"),
                    );
                    return;
                }
            };

            metrics::gauge!("translation_active_jobs").increment(1.0);
            let start = Instant::now();

            let result = manager.pipeline.run(job_id, &descriptor, &manager).await;

            metrics::histogram!("translation_processing_seconds")
                .record(start.elapsed().as_secs_f64());
            metrics::gauge!("translation_active_jobs").decrement(1.0);

            match result {
                Ok(output) => manager.complete(job_id, output),
                Err(e) => manager.fail(job_id, e.into()),
            }

            // The saved upload is consumed; stored artifacts carry the data on.
            let _ = tokio::fs::remove_file(&descriptor.video_path).await;
            drop(permit);
        });

        Ok(job_id)
    }

    /// Read-only snapshot of one job.
    pub fn get(&self, job_id: Uuid) -> Option<TranslationJob> {
        self.jobs.read().get(&job_id).cloned()
    }

    /// All known jobs, most-recently-created first.
    pub fn list(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.read();
        let mut summaries: Vec<JobSummary> = jobs.values().map(JobSummary::from).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        summaries
    }

    /// Worker-only: report progress. Ignored (with a warning) once terminal.
    pub(crate) fn advance(&self, job_id: Uuid, progress: u8, message: impl Into<String>) {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(&job_id) {
            Some(job) => {
                if !job.advance(progress, message) {
                    tracing::warn!(job_id = %job_id, "Progress update ignored on terminal job");
                }
            }
            None => tracing::warn!(job_id = %job_id, "Progress update for unknown job"),
        }
    }

    /// Worker-only: terminal success.
    pub(crate) fn complete(&self, job_id: Uuid, output: JobOutput) {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(&job_id) {
            Some(job) => {
                if job.complete(output) {
                    metrics::counter!("translation_jobs_completed").increment(1);
                    tracing::info!(job_id = %job_id, "Job completed");
                } else {
                    tracing::warn!(job_id = %job_id, "Completion ignored on terminal job");
                }
            }
            None => tracing::warn!(job_id = %job_id, "Completion for unknown job"),
        }
    }

    /// Worker-only: terminal failure.
    pub(crate) fn fail(&self, job_id: Uuid, error: JobError) {
        let mut jobs = self.jobs.write();
        match jobs.get_mut(&job_id) {
            Some(job) => {
                let kind = error.kind;
                let message = error.message.clone();
                if job.fail(error) {
                    metrics::counter!("translation_jobs_failed").increment(1);
                    tracing::warn!(job_id = %job_id, kind = %kind, error = %message, "Job failed");
                } else {
                    tracing::warn!(job_id = %job_id, "Failure ignored on terminal job");
                }
            }
            None => tracing::warn!(job_id = %job_id, "Failure for unknown job"),
        }
    }
}
