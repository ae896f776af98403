//! Per-task staged processing and run-level aggregation.
//!
//! One `run()` call performs one scan-and-drain cycle: take the run lock,
//! list the intake directories, and walk every discovered task through
//! readiness → normalize → transcribe → summarize → publish. Each stage
//! returns an explicit tagged outcome; a failed stage abandons the task,
//! never the run. Stage artifacts are deleted by the stage that consumed
//! them, success or failure alike, so a crashed task leaves at most one
//! orphan behind.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::{Summarizer, Transcriber};
use crate::config::{Config, INTERMEDIATE_MARKER};
use crate::domain::{ResultRecord, RunReport, Task};
use crate::ingest::IntakeScanner;
use crate::publish::Publisher;

use super::lock::RunLock;
use super::normalize::AudioNormalizer;
use super::readiness::StabilityDetector;

/// Which stage a task died in. Every failure is terminal for the task and
/// invisible to the rest of the batch.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("source file never became ready: {path}")]
    Readiness { path: String },

    #[error("audio normalization failed: {0}")]
    Normalize(#[source] super::normalize::NormalizeError),

    #[error("transcription failed: {0}")]
    Transcribe(anyhow::Error),

    #[error("summarization failed: {0}")]
    Summarize(anyhow::Error),

    #[error("publication failed: {0}")]
    Publish(anyhow::Error),
}

impl TaskError {
    /// Stage label used in failure logs.
    pub fn stage(&self) -> &'static str {
        match self {
            TaskError::Readiness { .. } => "readiness",
            TaskError::Normalize(_) => "normalize",
            TaskError::Transcribe(_) => "transcribe",
            TaskError::Summarize(_) => "summarize",
            TaskError::Publish(_) => "publish",
        }
    }
}

/// Orchestrates one full pipeline run.
pub struct Coordinator {
    config: Config,
    lock: RunLock,
    detector: StabilityDetector,
    normalizer: AudioNormalizer,
    scanner: IntakeScanner,
    publisher: Publisher,
    transcriber: Box<dyn Transcriber>,
    summarizer: Box<dyn Summarizer>,
}

impl Coordinator {
    /// Wire up the pipeline from resolved configuration plus the two
    /// injected external adapters.
    pub fn new(
        config: Config,
        transcriber: Box<dyn Transcriber>,
        summarizer: Box<dyn Summarizer>,
    ) -> Self {
        let lock = RunLock::new(&config.lock_path, config.lock_stale_after);
        let detector = StabilityDetector::new(config.poll_interval);
        let normalizer = AudioNormalizer::new(
            config.transcoder_binary.as_str(),
            config.normalize_max_retries,
            config.normalize_retry_delay,
        );
        let scanner = IntakeScanner::new(
            &config.video_dir,
            &config.audio_dir,
            &config.video_exts,
            &config.audio_exts,
            &config.exclude_patterns,
        );
        let publisher = Publisher::new(&config.publish_dir, config.publish_mount_prefix.as_str());

        Self {
            config,
            lock,
            detector,
            normalizer,
            scanner,
            publisher,
            transcriber,
            summarizer,
        }
    }

    /// One scan-and-drain cycle.
    ///
    /// Lock contention is a deliberate skip, not an error: the report comes
    /// back empty and no file is touched. Per-task failures are absorbed;
    /// only setup faults (unreadable intake, uncreatable directories)
    /// surface as `Err`.
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Pipeline run triggered");

        let Some(guard) = self.lock.acquire()? else {
            info!("Another run holds the lock, skipping this trigger");
            return Ok(RunReport::skipped());
        };

        let results = self.drain(run_id).await;
        guard.release();

        let report = results.map(RunReport::from_results)?;
        info!(
            %run_id,
            status = ?report.status,
            count = report.count,
            "Pipeline run finished"
        );
        Ok(report)
    }

    /// Process every discovered task sequentially, collecting successes.
    async fn drain(&self, run_id: Uuid) -> Result<Vec<ResultRecord>> {
        self.config.ensure_directories()?;

        let tasks = self.scanner.scan().await?;
        if tasks.is_empty() {
            info!(%run_id, "No new files, idling");
            return Ok(Vec::new());
        }

        info!(%run_id, task_count = tasks.len(), "Queue locked, starting batch");

        let mut results = Vec::new();
        for (index, task) in tasks.iter().enumerate() {
            match self.process_task(task).await {
                Ok(record) => {
                    info!(file = %task.name, "Task completed");
                    results.push(record);
                }
                Err(e) => {
                    error!(
                        file = %task.name,
                        stage = e.stage(),
                        error = %e,
                        "Task failed, continuing with next"
                    );
                }
            }

            // The only throttling in the system: let the machine breathe
            // between heavy transcode/inference cycles.
            if index + 1 < tasks.len() {
                tokio::time::sleep(self.config.task_pause).await;
            }
        }

        Ok(results)
    }

    /// Walk a single task through every stage.
    async fn process_task(&self, task: &Task) -> Result<ResultRecord, TaskError> {
        let source = task.source_path();
        info!(file = %task.name, media = %task.media_type, "Task starting");

        // Discovered → Ready
        let ready = self
            .detector
            .wait_until_ready(
                &source,
                self.config.stable_window,
                self.config.readiness_timeout,
            )
            .await;
        if !ready {
            return Err(TaskError::Readiness {
                path: source.display().to_string(),
            });
        }

        // Ready → Normalized
        let normalized = self
            .config
            .audio_dir
            .join(format!("{}{}.mp3", task.stem(), INTERMEDIATE_MARKER));
        self.normalizer
            .normalize(&source, &normalized)
            .await
            .map_err(TaskError::Normalize)?;

        // Normalized → SourceCleared: the content is captured, the original
        // may go. A failed delete is only a warning.
        remove_best_effort(&source, "source file").await;

        // SourceCleared → Transcribed, with unconditional artifact cleanup.
        let transcript = self
            .transcriber
            .transcribe(&normalized, &self.config.transcript_dir)
            .await;
        remove_best_effort(&normalized, "normalized audio").await;
        let transcript = transcript.map_err(TaskError::Transcribe)?;

        // Transcribed → Summarized, same cleanup discipline.
        let summary = self
            .summarizer
            .summarize(&transcript, &self.config.summary_dir)
            .await;
        remove_best_effort(&transcript, "transcript").await;
        let outcome = summary.map_err(TaskError::Summarize)?;

        // Summarized → Published → Done
        self.publisher
            .publish(&outcome.document_path, outcome.info, task.media_type)
            .map_err(TaskError::Publish)
    }
}

/// Delete a stage artifact, downgrading failure to a warning: by this point
/// the artifact's content lives on in the next stage's output.
async fn remove_best_effort(path: &Path, label: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(path = %path.display(), "Deleted {}", label),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete {}", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        let err = TaskError::Readiness {
            path: "/x/y.mp4".to_string(),
        };
        assert_eq!(err.stage(), "readiness");
        assert_eq!(
            TaskError::Transcribe(anyhow::anyhow!("boom")).stage(),
            "transcribe"
        );
        assert_eq!(
            TaskError::Publish(anyhow::anyhow!("boom")).stage(),
            "publish"
        );
    }
}
