mod app_state;
mod config;
mod models;
mod routes;
mod services;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{
    cache::LruStore,
    jobs::JobManager,
    media::Ffmpeg,
    pipeline::PipelineRunner,
    storage::LocalStorage,
    transcriber::WhisperCli,
    translation::{api_client::HttpTranslator, BatchTranslator},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = Arc::new(AppConfig::from_env().expect("Failed to load configuration"));

    tracing::info!("Initializing vidsub server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("translation_jobs_total", "Total translation jobs submitted");
    metrics::describe_counter!(
        "translation_jobs_completed",
        "Total translation jobs completed"
    );
    metrics::describe_counter!("translation_jobs_failed", "Total translation jobs that failed");
    metrics::describe_histogram!(
        "translation_processing_seconds",
        "Time to process one translation job"
    );
    metrics::describe_gauge!(
        "translation_active_jobs",
        "Jobs currently executing on a worker"
    );
    metrics::describe_counter!("cache_hits_total", "Cache lookups that hit, by scope");
    metrics::describe_counter!("cache_misses_total", "Cache lookups that missed, by scope");
    metrics::describe_gauge!("cache_entries", "Current cache entry count, by scope");
    metrics::describe_counter!(
        "cache_corruption_total",
        "Cached values dropped after failing the integrity check"
    );

    // The caches are explicitly constructed here and injected everywhere;
    // there are no ambient singletons.
    let job_cache = Arc::new(LruStore::new("job_result", config.job_cache_size));
    let segment_cache = Arc::new(LruStore::new("segment", config.segment_cache_size));

    // External capabilities
    tracing::info!("Initializing media capabilities");
    let transcriber = Arc::new(WhisperCli::new(
        config.whisper_bin.clone(),
        config.whisper_model_path.as_ref().map(PathBuf::from),
        config.whisper_model_dir.clone(),
    ));
    let media = Arc::new(Ffmpeg::new(config.ffmpeg_bin.clone()));
    let translator = Arc::new(HttpTranslator::new(
        config.translate_api_url.clone(),
        config.translate_api_key.clone(),
    ));
    let storage = Arc::new(LocalStorage::new(config.output_dir.clone()));

    let call_timeout = Duration::from_secs(config.capability_timeout_secs);
    let batch_translator = BatchTranslator::new(
        translator,
        Arc::clone(&segment_cache),
        config.translation_batch_size,
        config.translation_max_retries,
        Duration::from_millis(config.retry_backoff_ms),
        call_timeout,
    );

    let pipeline = Arc::new(PipelineRunner::new(
        transcriber,
        media,
        batch_translator,
        storage,
        Arc::clone(&job_cache),
        PathBuf::from(&config.output_dir).join("work"),
        config.whisper_model.clone(),
        call_timeout,
    ));

    let jobs = JobManager::new(pipeline, config.max_concurrent_jobs);

    let state = AppState::new(Arc::clone(&config), jobs, job_cache, segment_cache);

    // Build API routes
    let app = Router::new()
        .merge(routes::router(state))
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes));

    tracing::info!("Starting vidsub on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
