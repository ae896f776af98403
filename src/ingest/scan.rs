//! Intake directory scanning and task ordering.
//!
//! Both intake directories are listed once per run; there is no
//! watch-based change detection. Files pass an extension allow-list and a
//! glob exclusion list (hidden/system artifacts, in-progress markers), and
//! the combined task list is sorted by file name so a run's processing
//! order is reproducible.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use tracing::warn;

use crate::domain::{MediaType, Task};

/// One-shot scanner over the two intake directories.
pub struct IntakeScanner {
    video_dir: PathBuf,
    audio_dir: PathBuf,
    video_exts: Vec<String>,
    audio_exts: Vec<String>,
    exclude: Vec<Pattern>,
}

impl IntakeScanner {
    pub fn new(
        video_dir: impl Into<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        video_exts: &[String],
        audio_exts: &[String],
        exclude_patterns: &[String],
    ) -> Self {
        let exclude = exclude_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "Ignoring invalid exclusion pattern");
                    None
                }
            })
            .collect();

        Self {
            video_dir: video_dir.into(),
            audio_dir: audio_dir.into(),
            video_exts: video_exts.to_vec(),
            audio_exts: audio_exts.to_vec(),
            exclude,
        }
    }

    /// List both intake directories and build the run's ordered task list.
    pub async fn scan(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();

        // The video intake accepts any supported media; screen recordings
        // are often exported audio-only but still belong to that flow.
        let mut all_exts = self.video_exts.clone();
        all_exts.extend(self.audio_exts.iter().cloned());

        tasks.extend(
            self.list_dir(&self.video_dir, &all_exts, MediaType::Video)
                .await?,
        );
        tasks.extend(
            self.list_dir(&self.audio_dir, &self.audio_exts, MediaType::Audio)
                .await?,
        );

        tasks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tasks)
    }

    async fn list_dir(
        &self,
        dir: &Path,
        allowed_exts: &[String],
        media_type: MediaType,
    ) -> Result<Vec<Task>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut tasks = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to list intake directory: {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(_) => continue,
            };
            if !metadata.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if self.is_excluded(&name) || !has_allowed_extension(&path, allowed_exts) {
                continue;
            }

            tasks.push(Task::new(name, dir, media_type));
        }

        Ok(tasks)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(name))
    }
}

fn has_allowed_extension(path: &Path, allowed: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
