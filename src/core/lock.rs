//! Cross-run mutual exclusion via a filesystem marker token.
//!
//! Presence of the token means some process claims ownership of the
//! pipeline; absence means idle. The token is created atomically and
//! removed by a guard whose `Drop` fires on normal return and unwind alike,
//! so a crashed run does not leave the system locked. A process killed
//! without unwinding leaves a stale token that requires manual clearing
//! unless `stale_after` is configured.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Contents written into the lock token for operator diagnosis.
///
/// Only the file's presence carries meaning; the payload is advisory.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockToken {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

/// Whole-run mutual exclusion marker.
pub struct RunLock {
    path: PathBuf,

    /// When set, an existing token older than this is treated as abandoned
    /// and cleared before acquiring. `None` preserves manual-only recovery.
    stale_after: Option<Duration>,
}

impl RunLock {
    pub fn new(path: impl Into<PathBuf>, stale_after: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            stale_after,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to take ownership of the pipeline.
    ///
    /// Returns `Ok(None)` when a token already exists (another run is
    /// presumed active). On success the returned guard owns the token and
    /// removes it when dropped.
    pub fn acquire(&self) -> Result<Option<RunLockGuard>> {
        self.clear_if_stale();

        let created = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path);

        let mut file = match created {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create lock token: {}", self.path.display())
                });
            }
        };

        let token = LockToken {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };

        // Advisory payload only; an unwritable token still counts as held.
        if let Err(e) = serde_json::to_string(&token)
            .map_err(anyhow::Error::from)
            .and_then(|json| file.write_all(json.as_bytes()).map_err(anyhow::Error::from))
        {
            warn!(path = %self.path.display(), error = %e, "Failed to write lock token payload");
        }

        Ok(Some(RunLockGuard {
            path: self.path.clone(),
        }))
    }

    /// Remove an existing token older than the configured staleness
    /// threshold. No-op when `stale_after` is unset.
    fn clear_if_stale(&self) {
        let Some(stale_after) = self.stale_after else {
            return;
        };

        let age = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .and_then(|t| {
                t.elapsed()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
            });

        match age {
            Ok(age) if age > stale_after => {
                warn!(
                    path = %self.path.display(),
                    age_secs = age.as_secs(),
                    "Clearing stale lock token"
                );
                if let Err(e) = std::fs::remove_file(&self.path) {
                    warn!(error = %e, "Failed to clear stale lock token");
                }
            }
            _ => {}
        }
    }
}

/// Owned lock token. Removes the token on drop; removal failures are
/// logged, never raised.
pub struct RunLockGuard {
    path: PathBuf,
}

impl RunLockGuard {
    /// Release the lock explicitly. Idempotent with the drop-time removal.
    pub fn release(self) {
        // Drop performs the removal.
    }

    fn remove_token(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Run lock released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove lock token");
            }
        }
    }
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        self.remove_token();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lock_in(temp: &TempDir) -> RunLock {
        RunLock::new(temp.path().join("running.lock"), None)
    }

    #[test]
    fn test_acquire_creates_token() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        let guard = lock.acquire().unwrap();
        assert!(guard.is_some());
        assert!(lock.path().exists());

        let payload = std::fs::read_to_string(lock.path()).unwrap();
        let token: LockToken = serde_json::from_str(&payload).unwrap();
        assert_eq!(token.pid, std::process::id());
    }

    #[test]
    fn test_second_acquire_is_contended() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        let _guard = lock.acquire().unwrap().unwrap();
        assert!(lock.acquire().unwrap().is_none());
    }

    #[test]
    fn test_drop_removes_token() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        {
            let _guard = lock.acquire().unwrap().unwrap();
            assert!(lock.path().exists());
        }
        assert!(!lock.path().exists());
    }

    #[test]
    fn test_release_then_reacquire() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        let guard = lock.acquire().unwrap().unwrap();
        guard.release();
        assert!(!lock.path().exists());

        assert!(lock.acquire().unwrap().is_some());
    }

    #[test]
    fn test_release_idempotent_when_token_already_gone() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        let guard = lock.acquire().unwrap().unwrap();
        std::fs::remove_file(lock.path()).unwrap();
        // Must not panic or error.
        guard.release();
    }

    #[test]
    fn test_foreign_token_blocks_acquire() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        // Token left behind by another process (or a crash).
        std::fs::write(lock.path(), "stale").unwrap();
        assert!(lock.acquire().unwrap().is_none());
    }

    #[test]
    fn test_stale_token_cleared_when_configured() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("running.lock");
        std::fs::write(&path, "old run").unwrap();

        let lock = RunLock::new(&path, Some(Duration::from_secs(0)));
        // mtime is "now", so even a zero threshold needs a beat to elapse.
        std::thread::sleep(Duration::from_millis(20));
        assert!(lock.acquire().unwrap().is_some());
    }
}
