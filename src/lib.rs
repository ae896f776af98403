//! meeting-scribe - Polling media-to-minutes pipeline
//!
//! Watches two intake directories for dropped video/audio files and turns
//! each into a structured meeting-minutes document: normalize to canonical
//! audio, transcribe to timestamped text, summarize, publish for the
//! downstream automation flow.
//!
//! # Architecture
//!
//! One invocation is one run: take the run lock, scan both intakes, then
//! walk each file through the staged pipeline sequentially. Stage failures
//! abandon the file, never the batch; the lock is released however the run
//! ends. The only structured output is the final JSON report line.
//!
//! # Modules
//!
//! - `core`: coordination logic (RunLock, StabilityDetector,
//!   AudioNormalizer, Coordinator)
//! - `adapters`: external engines (whisper CLI, chat-completions LLM)
//! - `ingest`: intake scanning and task ordering
//! - `publish`: sanitized republication for the consumer
//! - `domain`: tasks, result records, the run report
//!
//! # Usage
//!
//! ```bash
//! # One scan-and-drain cycle (typically cron-triggered)
//! meeting-scribe
//! ```

pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod logging;
pub mod publish;

// Re-export main types at crate root for convenience
pub use adapters::{
    LlmConfig, MinutesSummarizer, SummaryInfo, SummaryOutcome, Summarizer, Transcriber,
    WhisperConfig, WhisperTranscriber,
};
pub use config::Config;
pub use self::core::{AudioNormalizer, Coordinator, RunLock, StabilityDetector, TaskError};
pub use domain::{MediaType, ResultRecord, RunReport, RunStatus, Task, REPORT_MARKER};
pub use publish::{sanitize_name, Publisher};
