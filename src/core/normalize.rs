//! Audio normalization via an external transcoder.
//!
//! Every intake file, video or audio, is flattened to the same canonical
//! format before transcription: mono, 16 kHz, 32 kbps. The transcoder is
//! invoked once per attempt with a fixed argument set; non-zero exits are
//! retried a bounded number of times with a fixed delay.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::warn;

/// Terminal normalization failures.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Transcoder failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Bounded-retry wrapper around the transcoder subprocess.
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    binary: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl AudioNormalizer {
    pub fn new(binary: impl Into<String>, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            binary: binary.into(),
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Fixed transcode argument set: strip video, mono, 16 kHz, 32 kbps,
    /// overwrite destination, errors only on stderr.
    fn transcode_args(input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-i"),
            input.as_os_str().to_os_string(),
            OsString::from("-vn"),
            OsString::from("-ac"),
            OsString::from("1"),
            OsString::from("-ar"),
            OsString::from("16000"),
            OsString::from("-ab"),
            OsString::from("32k"),
            output.as_os_str().to_os_string(),
            OsString::from("-y"),
            OsString::from("-loglevel"),
            OsString::from("error"),
        ]
    }

    /// Produce the canonical audio artifact at `output`.
    ///
    /// Failure is reported synchronously after all attempts are exhausted;
    /// it is never fatal to the calling run.
    pub async fn normalize(&self, input: &Path, output: &Path) -> Result<(), NormalizeError> {
        let args = Self::transcode_args(input, output);
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            let result = Command::new(&self.binary)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .await;

            match result {
                Ok(run) if run.status.success() => return Ok(()),
                Ok(run) => {
                    let stderr = String::from_utf8_lossy(&run.stderr);
                    last_error = format!(
                        "exit code {}: {}",
                        run.status.code().unwrap_or(-1),
                        stderr.trim()
                    );
                }
                Err(e) => {
                    last_error = format!("failed to spawn '{}': {}", self.binary, e);
                }
            }

            warn!(
                input = %input.display(),
                attempt,
                max_retries = self.max_retries,
                error = %last_error,
                "Transcode attempt failed"
            );

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(NormalizeError::Exhausted {
            attempts: self.max_retries,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_transcode_argument_order() {
        let args = AudioNormalizer::transcode_args(Path::new("in.mp4"), Path::new("out.mp3"));
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(
            rendered,
            vec![
                "-i", "in.mp4", "-vn", "-ac", "1", "-ar", "16000", "-ab", "32k", "out.mp3",
                "-y", "-loglevel", "error",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_transcode_copies_input() {
        let temp = TempDir::new().unwrap();
        // Input is $2, destination is ${10} in the fixed argument set.
        let stub = write_stub(temp.path(), "transcoder", "cp \"$2\" \"${10}\"");

        let input = temp.path().join("clip.mp4");
        let output = temp.path().join("clip_processed.mp3");
        std::fs::write(&input, b"media bytes").unwrap();

        let normalizer =
            AudioNormalizer::new(stub.to_string_lossy(), 3, Duration::from_millis(1));
        normalizer.normalize(&input, &output).await.unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"media bytes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_persistent_failure_exhausts_all_attempts() {
        let temp = TempDir::new().unwrap();
        let counter = temp.path().join("attempts");
        let stub = write_stub(
            temp.path(),
            "transcoder",
            &format!("echo x >> \"{}\"\nexit 1", counter.display()),
        );

        let input = temp.path().join("clip.mp4");
        std::fs::write(&input, b"media").unwrap();

        let normalizer =
            AudioNormalizer::new(stub.to_string_lossy(), 3, Duration::from_millis(1));
        let err = normalizer
            .normalize(&input, &temp.path().join("out.mp3"))
            .await
            .unwrap_err();

        let NormalizeError::Exhausted { attempts, .. } = err;
        assert_eq!(attempts, 3);

        let recorded = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(recorded.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_missing_binary_reports_exhaustion() {
        let temp = TempDir::new().unwrap();
        let normalizer = AudioNormalizer::new(
            temp.path().join("no-such-binary").to_string_lossy(),
            2,
            Duration::from_millis(1),
        );

        let err = normalizer
            .normalize(Path::new("in.mp4"), Path::new("out.mp3"))
            .await
            .unwrap_err();
        let NormalizeError::Exhausted { attempts, last_error } = err;
        assert_eq!(attempts, 2);
        assert!(last_error.contains("failed to spawn"));
    }
}
