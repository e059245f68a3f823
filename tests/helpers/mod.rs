//! Shared test doubles for the external capabilities, plus wiring helpers.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use vidsub::app_state::AppState;
use vidsub::config::AppConfig;
use vidsub::models::job::{JobOutput, JobStatus, TranslationJob};
use vidsub::models::transcript::{TimedSegment, Transcript};
use vidsub::services::cache::LruStore;
use vidsub::services::jobs::JobManager;
use vidsub::services::media::MediaTool;
use vidsub::services::pipeline::PipelineRunner;
use vidsub::services::storage::{ArtifactStore, StorageError};
use vidsub::services::transcriber::Transcriber;
use vidsub::services::translation::api_client::Translator;
use vidsub::services::translation::BatchTranslator;
use vidsub::services::CapabilityError;

/// Transcriber returning two fixed segments, counting invocations.
pub struct MockTranscriber {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _audio_path: &Path,
        _model_profile: &str,
    ) -> Result<Transcript, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let segments = vec![
            TimedSegment {
                start: 0.0,
                end: 4.5,
                text: "Hello and welcome.".to_string(),
            },
            TimedSegment {
                start: 4.5,
                end: 9.8,
                text: "This is a short clip.".to_string(),
            },
        ];
        Ok(Transcript {
            text: "Hello and welcome. This is a short clip.".to_string(),
            segments,
        })
    }
}

/// Media tool that fabricates its outputs, counting extractions.
pub struct MockMedia {
    pub extract_calls: AtomicUsize,
}

impl MockMedia {
    pub fn new() -> Self {
        Self {
            extract_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaTool for MockMedia {
    async fn extract_audio(
        &self,
        _video_path: &Path,
        audio_path: &Path,
    ) -> Result<(), CapabilityError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(audio_path, b"fake wav data")
            .await
            .map_err(|e| CapabilityError::Failed(e.to_string()))
    }

    async fn render_with_subtitles(
        &self,
        _video_path: &Path,
        _subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<(), CapabilityError> {
        tokio::fs::write(output_path, b"fake rendered video")
            .await
            .map_err(|e| CapabilityError::Failed(e.to_string()))
    }
}

/// Media tool whose underlying binary is absent.
pub struct UnavailableMedia;

#[async_trait]
impl MediaTool for UnavailableMedia {
    async fn extract_audio(
        &self,
        _video_path: &Path,
        _audio_path: &Path,
    ) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable(
            "media tool 'ffmpeg' not found; install ffmpeg or set FFMPEG_BIN".to_string(),
        ))
    }

    async fn render_with_subtitles(
        &self,
        _video_path: &Path,
        _subtitle_path: &Path,
        _output_path: &Path,
    ) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable(
            "media tool 'ffmpeg' not found; install ffmpeg or set FFMPEG_BIN".to_string(),
        ))
    }
}

/// Translator prefixing each text with the target language, counting calls.
pub struct MockTranslator {
    pub calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<String>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| format!("[{target_language}] {t}"))
            .collect())
    }
}

/// Storage that records nothing on disk and hands back synthetic locators.
pub struct MockStorage;

#[async_trait]
impl ArtifactStore for MockStorage {
    async fn store(&self, source: &Path, folder: &str) -> Result<String, StorageError> {
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact");
        Ok(format!("/files/{folder}/{name}"))
    }
}

/// Fully wired state over mock capabilities, sharing the given caches.
pub struct TestHarness {
    pub state: AppState,
    pub jobs: Arc<JobManager>,
    pub job_cache: Arc<LruStore<JobOutput>>,
    pub segment_cache: Arc<LruStore<String>>,
    pub transcriber: Arc<MockTranscriber>,
    pub translator: Arc<MockTranslator>,
    pub work_root: PathBuf,
}

pub fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("vidsub-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&root).expect("create temp root");
    root
}

pub fn build_harness(media: Arc<dyn MediaTool>, call_timeout: Duration) -> TestHarness {
    let work_root = temp_root();

    let mut config = AppConfig::default();
    config.upload_dir = work_root.join("uploads").to_string_lossy().into_owned();
    config.output_dir = work_root.join("output").to_string_lossy().into_owned();

    let job_cache = Arc::new(LruStore::new("job_result", config.job_cache_size));
    let segment_cache = Arc::new(LruStore::new("segment", config.segment_cache_size));
    let transcriber = Arc::new(MockTranscriber::new());
    let translator = Arc::new(MockTranslator::new());

    let batch_translator = BatchTranslator::new(
        Arc::clone(&translator) as Arc<dyn Translator>,
        Arc::clone(&segment_cache),
        4,
        3,
        Duration::ZERO,
        call_timeout,
    );

    let pipeline = Arc::new(PipelineRunner::new(
        Arc::clone(&transcriber) as Arc<dyn Transcriber>,
        media,
        batch_translator,
        Arc::new(MockStorage),
        Arc::clone(&job_cache),
        work_root.join("work"),
        "base".to_string(),
        call_timeout,
    ));

    let jobs = JobManager::new(pipeline, 4);
    let config = Arc::new(config);
    let state = AppState::new(
        Arc::clone(&config),
        Arc::clone(&jobs),
        Arc::clone(&job_cache),
        Arc::clone(&segment_cache),
    );

    TestHarness {
        state,
        jobs,
        job_cache,
        segment_cache,
        transcriber,
        translator,
        work_root,
    }
}

/// Write a synthetic "video" upload and return its path.
pub async fn write_clip(root: &Path, name: &str, content: &[u8]) -> PathBuf {
    let dir = root.join("uploads");
    tokio::fs::create_dir_all(&dir).await.expect("upload dir");
    let path = dir.join(name);
    tokio::fs::write(&path, content).await.expect("write clip");
    path
}

/// Poll a job until it reaches a terminal state.
pub async fn wait_for_terminal(jobs: &JobManager, id: Uuid) -> TranslationJob {
    for _ in 0..200 {
        if let Some(job) = jobs.get(id) {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("job {id} never reached a terminal state");
}

pub fn assert_completed(job: &TranslationJob) {
    assert_eq!(job.status, JobStatus::Completed, "job error: {:?}", job.error);
    assert_eq!(job.progress, 100);
}
