//! Intake tasks discovered by the directory scan.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which intake directory a file came from.
///
/// Anything deposited in the video intake is tagged `Video` even if it is
/// already audio-only; the tag describes the source, not the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Video,
    Audio,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
        }
    }
}

/// One discovered intake file awaiting processing in the current run.
///
/// Tasks are created by the scanner, consumed exactly once, and never
/// persisted beyond the run.
#[derive(Debug, Clone)]
pub struct Task {
    /// File name within the source directory.
    pub name: String,

    /// Directory the file was discovered in.
    pub source_dir: PathBuf,

    /// Source classification handed through to the final result record.
    pub media_type: MediaType,
}

impl Task {
    pub fn new(name: impl Into<String>, source_dir: impl Into<PathBuf>, media_type: MediaType) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            media_type,
        }
    }

    /// Absolute path of the source file.
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.name)
    }

    /// File name without its extension, used to derive artifact names.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_display() {
        assert_eq!(MediaType::Video.to_string(), "video");
        assert_eq!(MediaType::Audio.to_string(), "audio");
    }

    #[test]
    fn test_media_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&MediaType::Video).unwrap(), "\"video\"");
    }

    #[test]
    fn test_task_stem_strips_extension() {
        let task = Task::new("weekly sync.mp4", "/intake/video", MediaType::Video);
        assert_eq!(task.stem(), "weekly sync");
        assert_eq!(task.source_path(), PathBuf::from("/intake/video/weekly sync.mp4"));
    }
}
