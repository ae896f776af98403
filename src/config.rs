//! Pipeline configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (MEETING_SCRIBE_HOME, MEETING_SCRIBE_PUBLISH_DIR,
//!    DEEPSEEK_API_KEY)
//! 2. Optional config file (`config.yaml` in the base directory)
//! 3. Defaults anchored at the base directory
//!
//! The base directory defaults to the directory the executable lives in, so
//! a deployed binary keeps its intake and output folders beside itself. The
//! resolved `Config` is built once in `main` and passed into constructors;
//! nothing reads configuration ambiently after startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::{LlmConfig, WhisperConfig};

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "MEETING_SCRIBE_HOME";

/// Environment variable overriding the publish directory.
pub const PUBLISH_DIR_ENV: &str = "MEETING_SCRIBE_PUBLISH_DIR";

/// Environment variable carrying the summarizer credential.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Marker embedded in normalized-audio names; scanned files containing it
/// are treated as in-progress artifacts, not intake.
pub const INTERMEDIATE_MARKER: &str = "_processed";

/// Raw config file schema. Every field is optional; the file only overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub publish_dir: Option<PathBuf>,
    pub publish_mount_prefix: Option<String>,
    pub stable_window: Option<u32>,
    pub readiness_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub normalize_max_retries: Option<u32>,
    pub normalize_retry_delay_secs: Option<u64>,
    pub task_pause_secs: Option<u64>,
    pub lock_stale_after_secs: Option<u64>,
    pub transcoder_binary: Option<String>,
    #[serde(default)]
    pub whisper: Option<WhisperConfig>,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

/// Resolved pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Anchor for every fixed path below.
    pub base_dir: PathBuf,

    /// Video intake.
    pub video_dir: PathBuf,

    /// Audio intake; normalized artifacts are also written here under the
    /// intermediate marker.
    pub audio_dir: PathBuf,

    /// Transcript output.
    pub transcript_dir: PathBuf,

    /// Where the summarizer writes minutes documents (originals retained).
    pub summary_dir: PathBuf,

    /// Where sanitized copies are published for the consumer.
    pub publish_dir: PathBuf,

    /// Consumer-visible prefix substituted for `publish_dir`.
    pub publish_mount_prefix: String,

    /// Run-lock token path.
    pub lock_path: PathBuf,

    /// Append-only run log path.
    pub log_path: PathBuf,

    /// Consecutive stable polls required before a file is consumed.
    pub stable_window: u32,

    /// Ceiling on the readiness wait per file.
    pub readiness_timeout: Duration,

    /// Readiness poll interval.
    pub poll_interval: Duration,

    /// Total transcode attempts per file.
    pub normalize_max_retries: u32,

    /// Fixed delay between transcode attempts.
    pub normalize_retry_delay: Duration,

    /// Pause between tasks (not after the last).
    pub task_pause: Duration,

    /// When set, an existing lock token older than this is cleared.
    pub lock_stale_after: Option<Duration>,

    /// Transcoder binary.
    pub transcoder_binary: String,

    /// Extensions accepted in the video intake (the audio list is accepted
    /// there too).
    pub video_exts: Vec<String>,

    /// Extensions accepted in the audio intake.
    pub audio_exts: Vec<String>,

    /// Glob patterns excluded from scanning.
    pub exclude_patterns: Vec<String>,

    pub whisper: WhisperConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Defaults anchored at `base_dir`.
    pub fn defaults(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            video_dir: base_dir.join("video_input"),
            audio_dir: base_dir.join("audio_input"),
            transcript_dir: base_dir.join("text_output"),
            summary_dir: base_dir.join("summary_output"),
            publish_dir: base_dir.join("md_output"),
            publish_mount_prefix: "/home/node/.n8n-files/md_output".to_string(),
            lock_path: base_dir.join("running.lock"),
            log_path: base_dir.join("running.log"),
            stable_window: 3,
            readiness_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
            normalize_max_retries: 3,
            normalize_retry_delay: Duration::from_secs(2),
            task_pause: Duration::from_secs(3),
            lock_stale_after: None,
            transcoder_binary: "ffmpeg".to_string(),
            video_exts: vec!["mp4".into(), "mov".into(), "mkv".into(), "webm".into()],
            audio_exts: vec![
                "mp3".into(),
                "wav".into(),
                "m4a".into(),
                "aac".into(),
                "flac".into(),
            ],
            exclude_patterns: vec![
                ".*".into(),
                "._*".into(),
                format!("*{}*", INTERMEDIATE_MARKER),
            ],
            whisper: WhisperConfig::default(),
            llm: LlmConfig::default(),
            base_dir,
        }
    }

    /// Resolve configuration from the environment and the optional config
    /// file beside the binary.
    pub fn load() -> Result<Self> {
        let base_dir = match std::env::var(HOME_ENV) {
            Ok(home) => PathBuf::from(home),
            Err(_) => default_base_dir(),
        };

        // The lock token and log file live here; everything else is
        // created lazily once a run holds the lock.
        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create base directory: {}", base_dir.display()))?;

        let mut config = Self::defaults(&base_dir);

        let file_path = base_dir.join("config.yaml");
        if file_path.exists() {
            let file = load_config_file(&file_path)?;
            config.apply_file(file);
        }

        if let Ok(publish_dir) = std::env::var(PUBLISH_DIR_ENV) {
            config.publish_dir = PathBuf::from(publish_dir);
        }

        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            config.llm.api_key = api_key;
        }

        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(dir) = file.publish_dir {
            self.publish_dir = if dir.is_absolute() {
                dir
            } else {
                self.base_dir.join(dir)
            };
        }
        if let Some(prefix) = file.publish_mount_prefix {
            self.publish_mount_prefix = prefix;
        }
        if let Some(window) = file.stable_window {
            self.stable_window = window;
        }
        if let Some(secs) = file.readiness_timeout_secs {
            self.readiness_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.poll_interval_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(retries) = file.normalize_max_retries {
            self.normalize_max_retries = retries;
        }
        if let Some(secs) = file.normalize_retry_delay_secs {
            self.normalize_retry_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = file.task_pause_secs {
            self.task_pause = Duration::from_secs(secs);
        }
        if let Some(secs) = file.lock_stale_after_secs {
            self.lock_stale_after = Some(Duration::from_secs(secs));
        }
        if let Some(binary) = file.transcoder_binary {
            self.transcoder_binary = binary;
        }
        if let Some(whisper) = file.whisper {
            self.whisper = whisper;
        }
        if let Some(llm) = file.llm {
            let api_key = std::mem::take(&mut self.llm.api_key);
            self.llm = llm;
            self.llm.api_key = api_key;
        }
    }

    /// Create every directory a run writes into. Called after the lock is
    /// held so a contended invocation touches nothing.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.video_dir,
            &self.audio_dir,
            &self.transcript_dir,
            &self.summary_dir,
            &self.publish_dir,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Base directory when no override is set: the executable's directory,
/// falling back to the current directory.
fn default_base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
