//! Whisper transcription backend.
//!
//! Shells out to a local whisper binary, collects its JSON output from a
//! temp directory, and re-renders the segments as one timestamped line per
//! segment for the summarizer.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::info;

use super::Transcriber;

/// Configuration for the whisper subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Path or name of the whisper binary.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Model name or local model path.
    #[serde(default = "default_model")]
    pub model: String,

    /// Language hint passed to the engine.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_binary() -> String {
    "whisper".to_string()
}
fn default_model() -> String {
    "turbo".to_string()
}
fn default_language() -> String {
    "en".to_string()
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            model: default_model(),
            language: default_language(),
        }
    }
}

/// Whisper JSON output structure
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    #[serde(default)]
    text: String,
}

/// Transcription adapter backed by the local whisper CLI.
pub struct WhisperTranscriber {
    config: WhisperConfig,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;

        let stem = audio.file_stem().unwrap_or_default().to_string_lossy();
        let output_path = output_dir.join(format!("{}.txt", stem));

        // A transcript left over from an interrupted run is reused as-is.
        if output_path.exists() {
            info!(path = %output_path.display(), "Transcript already exists, skipping");
            return Ok(output_path);
        }

        info!(file = %audio.display(), model = %self.config.model, "Transcribing");

        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;

        let output = Command::new(&self.config.binary)
            .arg(audio)
            .arg("--model")
            .arg(&self.config.model)
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json")
            .arg("--language")
            .arg(&self.config.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run whisper")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Whisper failed: {}", stderr.trim());
        }

        let json_path = temp_dir.path().join(format!("{}.json", stem));
        let json_content = tokio::fs::read_to_string(&json_path)
            .await
            .context("Failed to read whisper output")?;

        let whisper: WhisperOutput =
            serde_json::from_str(&json_content).context("Failed to parse whisper JSON")?;

        let transcript = render_transcript(&whisper.segments);
        if transcript.is_empty() {
            anyhow::bail!("Whisper produced no speech segments for {}", audio.display());
        }

        tokio::fs::write(&output_path, transcript)
            .await
            .with_context(|| format!("Failed to write transcript: {}", output_path.display()))?;

        Ok(output_path)
    }
}

/// Render segments as `[MM:SS.mmm --> MM:SS.mmm] text` lines, one per
/// non-empty segment.
fn render_transcript(segments: &[WhisperSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "[{} --> {}] {}\n",
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            text
        ));
    }
    out
}

/// Format seconds as `MM:SS.mmm`.
fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mm = (seconds / 60.0) as u64;
    let ss = (seconds % 60.0) as u64;
    let ms = ((seconds - seconds.floor()) * 1000.0) as u64;
    format!("{:02}:{:02}.{:03}", mm, ss, ms)
}
