//! Transcription capability: timed speech-to-text over an audio file.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::models::transcript::{TimedSegment, Transcript};
use crate::services::CapabilityError;

/// Speech-to-text over an extracted audio track.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio_path` with the given model profile (e.g. "base",
    /// "small"). Fails if the audio is unreadable or the profile is
    /// unavailable.
    async fn transcribe(
        &self,
        audio_path: &Path,
        model_profile: &str,
    ) -> Result<Transcript, CapabilityError>;
}

/// Shells out to a whisper.cpp-style CLI (`whisper-cli`) producing JSON.
pub struct WhisperCli {
    bin: String,
    /// Optional explicit model file. When set it wins over profile
    /// resolution and is passed as `-m` unconditionally.
    model_path: Option<PathBuf>,
    /// Directory searched for `ggml-{profile}.bin` when no explicit model
    /// file is configured.
    model_dir: PathBuf,
}

#[derive(Deserialize)]
struct WhisperOutput {
    transcription: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Deserialize)]
struct WhisperOffsets {
    /// Milliseconds from the start of the audio.
    from: u64,
    to: u64,
}

impl WhisperCli {
    pub fn new(
        bin: impl Into<String>,
        model_path: Option<PathBuf>,
        model_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bin: bin.into(),
            model_path,
            model_dir: model_dir.into(),
        }
    }

    /// Resolve the model file for a profile. An explicit model path takes
    /// precedence; otherwise the profile maps to the conventional
    /// `ggml-{profile}.bin` under the model directory.
    fn resolve_model(&self, model_profile: &str) -> Result<PathBuf, CapabilityError> {
        if let Some(explicit) = &self.model_path {
            if !explicit.exists() {
                return Err(CapabilityError::Unavailable(format!(
                    "configured model file not found: {}",
                    explicit.display()
                )));
            }
            return Ok(explicit.clone());
        }

        let conventional = self.model_dir.join(format!("ggml-{model_profile}.bin"));
        if !conventional.exists() {
            return Err(CapabilityError::Unavailable(format!(
                "model profile '{model_profile}' unavailable: no model at {}",
                conventional.display()
            )));
        }
        Ok(conventional)
    }

    fn parse_output(&self, raw: &str) -> Result<Transcript, CapabilityError> {
        let output: WhisperOutput = serde_json::from_str(raw).map_err(|e| {
            CapabilityError::Failed(format!("unparseable transcription output: {e}"))
        })?;

        let segments: Vec<TimedSegment> = output
            .transcription
            .into_iter()
            .map(|s| TimedSegment {
                start: s.offsets.from as f64 / 1000.0,
                end: s.offsets.to as f64 / 1000.0,
                text: s.text.trim().to_string(),
            })
            .collect();

        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Transcript { text, segments })
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(
        &self,
        audio_path: &Path,
        model_profile: &str,
    ) -> Result<Transcript, CapabilityError> {
        if !audio_path.exists() {
            return Err(CapabilityError::InvalidInput(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }

        let model = self.resolve_model(model_profile)?;

        // whisper.cpp writes <stem>.json next to the requested output stem.
        let out_stem = audio_path.with_extension("transcript");
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-f")
            .arg(audio_path)
            .arg("-oj")
            .arg("-of")
            .arg(&out_stem)
            .arg("-np")
            .arg("-m")
            .arg(&model)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        tracing::debug!(
            audio = %audio_path.display(),
            profile = model_profile,
            model = %model.display(),
            "Invoking transcription binary"
        );

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CapabilityError::Unavailable(format!(
                    "transcription binary '{}' not found; install whisper.cpp or set WHISPER_BIN",
                    self.bin
                ))
            } else {
                CapabilityError::Failed(format!("failed to launch '{}': {e}", self.bin))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CapabilityError::Failed(format!(
                "transcription exited with {}: {}",
                output.status,
                stderr.lines().last().unwrap_or("no diagnostic output")
            )));
        }

        let json_path = out_stem.with_extension("json");
        let raw = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            CapabilityError::Failed(format!(
                "transcription produced no output at {}: {e}",
                json_path.display()
            ))
        })?;
        let _ = tokio::fs::remove_file(&json_path).await;

        self.parse_output(&raw)
    }
}
