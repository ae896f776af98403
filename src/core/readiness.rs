//! File-readiness detection via size-stability polling.
//!
//! Intake files arrive from cloud sync, network shares, and screen
//! recorders, so a freshly listed file may still be mid-write. A file is
//! considered ready once its size has been observed unchanged and positive
//! for a configured number of consecutive polls.

use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Size-stability gate for intake files.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    poll_interval: Duration,
}

impl StabilityDetector {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Block until `path` has held a constant, positive size for
    /// `stable_window` consecutive polls.
    ///
    /// Returns `false` when the path does not exist at call time or when
    /// `timeout` elapses first. A transient metadata error is a
    /// non-observation: it neither advances nor resets the counter.
    pub async fn wait_until_ready(
        &self,
        path: &Path,
        stable_window: u32,
        timeout: Duration,
    ) -> bool {
        if !path.exists() {
            return false;
        }

        debug!(path = %path.display(), "Waiting for file to stabilize");

        let start = Instant::now();
        let mut last_size: Option<u64> = None;
        let mut stable_polls = 0u32;

        loop {
            if start.elapsed() > timeout {
                return false;
            }

            if let Ok(metadata) = tokio::fs::metadata(path).await {
                let size = metadata.len();
                if size > 0 && last_size == Some(size) {
                    stable_polls += 1;
                } else {
                    stable_polls = 0;
                }
                last_size = Some(size);

                if stable_polls >= stable_window {
                    return true;
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_detector() -> StabilityDetector {
        StabilityDetector::new(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_missing_file_fails_immediately() {
        let temp = TempDir::new().unwrap();
        let detector = fast_detector();

        let ready = detector
            .wait_until_ready(&temp.path().join("nope.mp4"), 2, Duration::from_secs(1))
            .await;
        assert!(!ready);
    }

    #[tokio::test]
    async fn test_stable_file_becomes_ready() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("clip.mp4");
        tokio::fs::write(&path, b"finished upload").await.unwrap();

        let ready = fast_detector()
            .wait_until_ready(&path, 3, Duration::from_secs(2))
            .await;
        assert!(ready);
    }

    #[tokio::test]
    async fn test_empty_file_never_stabilizes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.mp4");
        tokio::fs::write(&path, b"").await.unwrap();

        let ready = fast_detector()
            .wait_until_ready(&path, 2, Duration::from_millis(120))
            .await;
        assert!(!ready);
    }

    #[tokio::test]
    async fn test_growing_file_resets_the_counter() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("upload.mp4");
        tokio::fs::write(&path, b"part").await.unwrap();

        // Keep appending for longer than the timeout allows stabilization.
        let writer_path = path.clone();
        let writer = tokio::spawn(async move {
            for _ in 0..20 {
                let mut contents = tokio::fs::read(&writer_path).await.unwrap();
                contents.extend_from_slice(b"more");
                tokio::fs::write(&writer_path, &contents).await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let ready = fast_detector()
            .wait_until_ready(&path, 5, Duration::from_millis(150))
            .await;
        writer.abort();
        assert!(!ready);
    }
}
