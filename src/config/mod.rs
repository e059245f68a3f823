use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory for stored artifacts, served under /files/.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory where uploads land before processing.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// whisper.cpp-style CLI binary for transcription.
    #[serde(default = "default_whisper_bin")]
    pub whisper_bin: String,

    /// Transcription model profile ("tiny" | "base" | "small" | ...).
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// Explicit model file passed to the transcription binary as -m.
    /// Overrides profile resolution entirely.
    #[serde(default)]
    pub whisper_model_path: Option<String>,

    /// Directory searched for ggml-{profile}.bin model files.
    #[serde(default = "default_whisper_model_dir")]
    pub whisper_model_dir: String,

    /// ffmpeg binary for extraction and rendering.
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// LibreTranslate-compatible translation endpoint.
    #[serde(default = "default_translate_api_url")]
    pub translate_api_url: String,

    /// Optional API key for the translation provider.
    #[serde(default)]
    pub translate_api_key: Option<String>,

    /// Whole-job-result cache capacity (entries).
    #[serde(default = "default_job_cache_size")]
    pub job_cache_size: usize,

    /// Segment-translation cache capacity (entries).
    #[serde(default = "default_segment_cache_size")]
    pub segment_cache_size: usize,

    /// Maximum segments per translation provider call.
    #[serde(default = "default_translation_batch_size")]
    pub translation_batch_size: usize,

    /// Attempts per translation batch before giving up on it.
    #[serde(default = "default_translation_max_retries")]
    pub translation_max_retries: u32,

    /// Base backoff between batch retries; scaled linearly by attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Bound on any single external capability call.
    #[serde(default = "default_capability_timeout_secs")]
    pub capability_timeout_secs: u64,

    /// Worker pool size: jobs processed simultaneously.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Request body limit for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_whisper_bin() -> String {
    "whisper-cli".to_string()
}

fn default_whisper_model() -> String {
    "base".to_string()
}

fn default_whisper_model_dir() -> String {
    "models".to_string()
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_translate_api_url() -> String {
    "http://localhost:5000/translate".to_string()
}

fn default_job_cache_size() -> usize {
    100
}

fn default_segment_cache_size() -> usize {
    10_000
}

fn default_translation_batch_size() -> usize {
    25
}

fn default_translation_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_capability_timeout_secs() -> u64 {
    300
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_max_upload_bytes() -> usize {
    200 * 1024 * 1024
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        // envy with no matching variables set yields all serde defaults.
        envy::from_iter::<_, Self>(std::iter::empty::<(String, String)>())
            .expect("every AppConfig field carries a default")
    }
}
