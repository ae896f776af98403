//! Publication of minutes documents for the downstream consumer.
//!
//! The summarizer's document stays where it was written; publication copies
//! it into the publish directory under a filesystem-safe name and rewrites
//! the path to the prefix the consumer's container sees. Names produced by
//! the model routinely contain `10:48`-style times that break URL and path
//! handling downstream, hence the sanitization.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::SummaryInfo;
use crate::domain::{MediaType, ResultRecord};

/// Replace path- and time-ambiguous characters in a file name.
///
/// `:`, `/` and `\` become `-`; spaces become `_`. Applying the rule twice
/// yields the same result as once.
pub fn sanitize_name(name: &str) -> String {
    name.replace(':', "-")
        .replace('/', "-")
        .replace('\\', "-")
        .replace(' ', "_")
}

/// Copies documents into the publish directory and builds the final record.
pub struct Publisher {
    publish_dir: PathBuf,
    mount_prefix: String,
}

impl Publisher {
    pub fn new(publish_dir: impl Into<PathBuf>, mount_prefix: impl Into<String>) -> Self {
        Self {
            publish_dir: publish_dir.into(),
            mount_prefix: mount_prefix.into(),
        }
    }

    /// Publish `document` and produce the task's result record.
    ///
    /// The source document is copied, not moved; the original stays in the
    /// summary directory. The record's path points at the consumer's mount,
    /// not the host filesystem.
    pub fn publish(
        &self,
        document: &Path,
        info: SummaryInfo,
        source_type: MediaType,
    ) -> Result<ResultRecord> {
        if !document.exists() {
            anyhow::bail!("Minutes document missing: {}", document.display());
        }

        let original_name = document
            .file_name()
            .context("Minutes document has no file name")?
            .to_string_lossy();
        let safe_name = sanitize_name(&original_name);
        let destination = self.publish_dir.join(&safe_name);

        std::fs::copy(document, &destination).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                document.display(),
                destination.display()
            )
        })?;

        let full_path = format!("{}/{}", self.mount_prefix.trim_end_matches('/'), safe_name);
        info!(name = %safe_name, path = %full_path, "Published minutes document");

        Ok(ResultRecord {
            file_name: safe_name,
            title: info.title,
            summary: info.summary,
            todo_content: info.todo_content,
            full_markdown: info.full_markdown,
            full_path,
            source_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn info(file_name: &str) -> SummaryInfo {
        SummaryInfo {
            file_name: file_name.to_string(),
            title: "Standup".to_string(),
            summary: "Quick sync".to_string(),
            todo_content: String::new(),
            full_markdown: "# Meeting Minutes: Standup".to_string(),
        }
    }

    #[test]
    fn test_sanitize_replaces_each_character_class() {
        assert_eq!(sanitize_name("10:48 sync.md"), "10-48_sync.md");
        assert_eq!(sanitize_name("a/b\\c d.md"), "a-b-c_d.md");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_name("team sync: 10/48.md");
        assert_eq!(sanitize_name(&once), once);
    }

    #[test]
    fn test_sanitized_names_contain_no_reserved_characters() {
        let name = sanitize_name("a:b/c\\d e.md");
        assert!(!name.contains(':'));
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_publish_copies_and_rewrites_path() {
        let temp = TempDir::new().unwrap();
        let publish_dir = temp.path().join("md_output");
        std::fs::create_dir_all(&publish_dir).unwrap();

        let document = temp.path().join("standup 10:30_minutes.md");
        std::fs::write(&document, "# Meeting Minutes: Standup").unwrap();

        let publisher = Publisher::new(&publish_dir, "/home/node/.n8n-files/md_output");
        let record = publisher
            .publish(&document, info("standup 10:30_minutes.md"), MediaType::Audio)
            .unwrap();

        assert_eq!(record.file_name, "standup_10-30_minutes.md");
        assert_eq!(
            record.full_path,
            "/home/node/.n8n-files/md_output/standup_10-30_minutes.md"
        );
        assert_eq!(record.source_type, MediaType::Audio);

        // Copied, not moved.
        assert!(document.exists());
        assert!(publish_dir.join("standup_10-30_minutes.md").exists());
    }

    #[test]
    fn test_publish_fails_when_document_missing() {
        let temp = TempDir::new().unwrap();
        let publisher = Publisher::new(temp.path(), "/mnt/out");

        let result = publisher.publish(
            &temp.path().join("ghost.md"),
            info("ghost.md"),
            MediaType::Video,
        );
        assert!(result.is_err());
    }
}
