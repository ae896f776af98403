//! Run report and per-task result records.
//!
//! The report is the only structured output of a run; everything else is
//! side-effect files and log narration. The downstream automation flow
//! scrapes the final stdout line, so the marker prefix and field names are
//! part of the external contract.

use chrono::Local;
use serde::{Deserialize, Serialize};

use super::task::MediaType;

/// Prefix of the final stdout line carrying the JSON report.
pub const REPORT_MARKER: &str = "N8N_RESULT:";

/// Metadata for one fully processed file.
///
/// Produced only when every stage of a task succeeds; immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Sanitized name of the published document.
    pub file_name: String,

    /// Title extracted from the minutes document.
    pub title: String,

    /// One-line summary section body.
    pub summary: String,

    /// Decisions/TODO section body.
    pub todo_content: String,

    /// Full document text.
    pub full_markdown: String,

    /// Container-visible path of the published document.
    pub full_path: String,

    /// Which intake the source file came from.
    pub source_type: MediaType,
}

/// Run status as observed by the downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    SkippedOrEmpty,
}

/// Aggregate outcome of one scan-and-drain cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub count: usize,
    pub details: Vec<ResultRecord>,
    pub time: String,
}

impl RunReport {
    /// Build the report from the run's collected results.
    ///
    /// A run with zero results reports `skipped_or_empty` whether the queue
    /// was empty, the lock was contended, or every task failed; the consumer
    /// only distinguishes "something published" from "nothing published".
    pub fn from_results(details: Vec<ResultRecord>) -> Self {
        let status = if details.is_empty() {
            RunStatus::SkippedOrEmpty
        } else {
            RunStatus::Completed
        };

        Self {
            status,
            count: details.len(),
            details,
            time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Report for a run that never started draining (lock contention).
    pub fn skipped() -> Self {
        Self::from_results(Vec::new())
    }

    /// The marker-prefixed stdout line consumed downstream.
    pub fn to_stdout_line(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("{} {}", REPORT_MARKER, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ResultRecord {
        ResultRecord {
            file_name: name.to_string(),
            title: "Weekly sync".to_string(),
            summary: "Short".to_string(),
            todo_content: String::new(),
            full_markdown: "# Meeting Minutes: Weekly sync".to_string(),
            full_path: format!("/home/node/.n8n-files/md_output/{}", name),
            source_type: MediaType::Video,
        }
    }

    #[test]
    fn test_empty_report_is_skipped() {
        let report = RunReport::from_results(Vec::new());
        assert_eq!(report.status, RunStatus::SkippedOrEmpty);
        assert_eq!(report.count, 0);
        assert!(report.details.is_empty());
    }

    #[test]
    fn test_report_with_results_is_completed() {
        let report = RunReport::from_results(vec![record("a.md"), record("b.md")]);
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.count, 2);
    }

    #[test]
    fn test_status_serialization() {
        let report = RunReport::skipped();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"skipped_or_empty\""));
        assert!(json.contains("\"details\":[]"));
    }

    #[test]
    fn test_stdout_line_has_marker() {
        let line = RunReport::from_results(vec![record("x.md")]).to_stdout_line();
        assert!(line.starts_with("N8N_RESULT: {"));
        assert!(line.contains("\"status\":\"completed\""));
    }
}
