//! Adapter interfaces for the external heavy lifting.
//!
//! The speech-to-text engine and the summarization model live behind narrow
//! trait contracts so the coordinator never touches their wire details and
//! tests can substitute stubs. Adapters hold only immutable configuration
//! handed to them at startup.

pub mod summarizer;
pub mod whisper;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Re-export the concrete adapters
pub use summarizer::{LlmConfig, MinutesSummarizer};
pub use whisper::{WhisperConfig, WhisperTranscriber};

/// Metadata extracted from a minutes document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryInfo {
    /// Name of the document file the metadata came from.
    pub file_name: String,

    /// Title line of the document.
    pub title: String,

    /// One-line summary section body.
    pub summary: String,

    /// Decisions/TODO section body.
    pub todo_content: String,

    /// Full document text.
    pub full_markdown: String,
}

/// A generated minutes document plus its extracted metadata.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub document_path: PathBuf,
    pub info: SummaryInfo,
}

/// Speech-to-text over a normalized audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio` into a timestamped text file under `output_dir`
    /// and return the file's path. Producing nothing is a failure.
    async fn transcribe(&self, audio: &Path, output_dir: &Path) -> Result<PathBuf>;
}

/// Structured meeting-minutes generation over a transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `transcript` into a minutes document under `output_dir`.
    async fn summarize(&self, transcript: &Path, output_dir: &Path) -> Result<SummaryOutcome>;
}
