//! Media extraction and render capability, backed by ffmpeg.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::services::CapabilityError;

/// Extensions that already carry a bare audio stream; extraction degrades to
/// a copy for these, exactly as the upstream service did.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac", "flac", "ogg", "wma"];

/// Audio extraction and subtitle rendering over local media files.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Extract the audio track of `video_path` into a 16 kHz mono WAV file.
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<(), CapabilityError>;

    /// Burn `subtitle_path` into `video_path`, writing `output_path`.
    async fn render_with_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<(), CapabilityError>;
}

/// ffmpeg-backed implementation.
pub struct Ffmpeg {
    bin: String,
}

impl Ffmpeg {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, args: &[&std::ffi::OsStr], action: &str) -> Result<(), CapabilityError> {
        let output = Command::new(&self.bin)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CapabilityError::Unavailable(format!(
                        "media tool '{}' not found; install ffmpeg or set FFMPEG_BIN",
                        self.bin
                    ))
                } else {
                    CapabilityError::Failed(format!("failed to launch '{}': {e}", self.bin))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CapabilityError::Failed(format!(
                "{action} exited with {}: {}",
                output.status,
                stderr.lines().last().unwrap_or("no diagnostic output")
            )));
        }
        Ok(())
    }
}

fn check_input(path: &Path) -> Result<(), CapabilityError> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        CapabilityError::InvalidInput(format!("input file not found: {}", path.display()))
    })?;
    if metadata.len() == 0 {
        return Err(CapabilityError::InvalidInput(format!(
            "input file is empty: {}",
            path.display()
        )));
    }
    Ok(())
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<(), CapabilityError> {
        check_input(video_path)?;

        if is_audio_file(video_path) {
            tracing::debug!(input = %video_path.display(), "Input is already audio, copying");
            tokio::fs::copy(video_path, audio_path).await.map_err(|e| {
                CapabilityError::Failed(format!("failed to copy audio input: {e}"))
            })?;
            return Ok(());
        }

        // 16 kHz mono PCM, the sample rate the transcription models expect.
        let args: Vec<PathBuf> = vec![
            "-y".into(),
            "-i".into(),
            video_path.into(),
            "-vn".into(),
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ar".into(),
            "16000".into(),
            "-ac".into(),
            "1".into(),
            audio_path.into(),
        ];
        let args: Vec<&std::ffi::OsStr> = args.iter().map(|a| a.as_os_str()).collect();
        self.run(&args, "audio extraction").await
    }

    async fn render_with_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<(), CapabilityError> {
        check_input(video_path)?;
        check_input(subtitle_path)?;

        let filter = format!("subtitles={}", subtitle_path.display());
        let args: Vec<PathBuf> = vec![
            "-y".into(),
            "-i".into(),
            video_path.into(),
            "-vf".into(),
            filter.into(),
            "-c:a".into(),
            "copy".into(),
            output_path.into(),
        ];
        let args: Vec<&std::ffi::OsStr> = args.iter().map(|a| a.as_os_str()).collect();
        self.run(&args, "subtitle render").await
    }
}
