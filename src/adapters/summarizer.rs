//! LLM meeting-minutes summarizer.
//!
//! Sends the transcript to an OpenAI-compatible chat-completions endpoint
//! with a system prompt that pins the document template, writes the reply
//! as a Markdown file, and extracts the structured metadata the downstream
//! consumer needs (title, one-line summary, decisions/TODO block).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{SummaryInfo, SummaryOutcome, Summarizer};

/// Suffix appended to the transcript stem for the generated document.
const MINUTES_SUFFIX: &str = "_minutes.md";

const TITLE_PREFIX: &str = "# Meeting Minutes:";
const SUMMARY_HEADER: &str = "## One-line Summary";
const TODO_HEADER: &str = "## Decisions & Action Items (TODO)";

const SYSTEM_PROMPT: &str = r#"You are a senior meeting-minutes secretary. Given a meeting transcript, produce a Markdown document in exactly this structure, keeping the heading levels unchanged:

# Meeting Minutes: {a title that captures the meeting}

## One-line Summary
{at most 50 words covering the meeting's core purpose}

## Key Topics & Discussion
- {topic 1}: {core viewpoint or point of contention}
- {topic 2}: ...

## Decisions & Action Items (TODO)
**Decisions:**
- [P0] {decision}
- [P1] {decision}

**Action Items:**
- [ ] @{owner}: {concrete action} [due date]
- [ ] @unassigned: {concrete action}

## Full Notes
{the detailed record, in chronological or logical order, kept for reference}

In the Decisions & Action Items section, keep decisions and concrete tasks separate, and give every action item an owner."#;

/// Configuration for the chat-completions call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base, e.g. `https://api.deepseek.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer credential. Never read from the config file; injected from
    /// the environment at startup.
    #[serde(skip)]
    pub api_key: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Summarization adapter backed by a chat-completions endpoint.
pub struct MinutesSummarizer {
    config: LlmConfig,
    client: reqwest::Client,
}

impl MinutesSummarizer {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn request_minutes(&self, transcript_text: &str) -> Result<String> {
        let user_content = format!("Meeting transcript follows:\n\n{}", transcript_text);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to reach summarization endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Summarization endpoint error ({}): {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse summarization response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Summarization response contained no choices")
    }
}

#[async_trait]
impl Summarizer for MinutesSummarizer {
    async fn summarize(&self, transcript: &Path, output_dir: &Path) -> Result<SummaryOutcome> {
        tokio::fs::create_dir_all(output_dir).await?;

        let stem = transcript.file_stem().unwrap_or_default().to_string_lossy();
        let file_name = format!("{}{}", stem, MINUTES_SUFFIX);
        let output_path = output_dir.join(&file_name);

        // A document left over from an interrupted run is reused; only the
        // metadata extraction is repeated.
        if output_path.exists() {
            info!(path = %output_path.display(), "Minutes document already exists, skipping");
            let content = tokio::fs::read_to_string(&output_path).await?;
            return Ok(SummaryOutcome {
                info: extract_info(&content, &file_name),
                document_path: output_path,
            });
        }

        let transcript_text = tokio::fs::read_to_string(transcript)
            .await
            .with_context(|| format!("Failed to read transcript: {}", transcript.display()))?;

        info!(file = %transcript.display(), model = %self.config.model, "Summarizing");

        let minutes = self.request_minutes(&transcript_text).await?;

        tokio::fs::write(&output_path, &minutes)
            .await
            .with_context(|| format!("Failed to write minutes: {}", output_path.display()))?;

        Ok(SummaryOutcome {
            info: extract_info(&minutes, &file_name),
            document_path: output_path,
        })
    }
}

/// Pull the structured fields out of a minutes document.
///
/// Missing sections degrade to fallbacks rather than failing: the document
/// itself is still publishable even when the model strayed from the
/// template.
pub fn extract_info(text: &str, file_name: &str) -> SummaryInfo {
    let title = text
        .lines()
        .find_map(|line| line.strip_prefix(TITLE_PREFIX))
        .map(|rest| rest.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file_name.to_string());

    let summary = section_body(text, SUMMARY_HEADER)
        .unwrap_or_else(|| "(summary section missing)".to_string());

    let todo_content = section_body(text, TODO_HEADER).unwrap_or_default();

    SummaryInfo {
        file_name: file_name.to_string(),
        title,
        summary,
        todo_content,
        full_markdown: text.to_string(),
    }
}

/// Body of a `##` section: the lines between the header and the next
/// heading, trimmed. `None` when the header is absent.
fn section_body(text: &str, header: &str) -> Option<String> {
    let mut lines = text.lines();
    lines.by_ref().find(|line| line.trim() == header)?;

    let body: Vec<&str> = lines
        .take_while(|line| !line.starts_with("## ") && !line.starts_with("# "))
        .collect();

    Some(body.join("\n").trim().to_string())
}
