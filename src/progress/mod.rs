//! Import run state shared with status pollers.
//!
//! The orchestrator writes through [`ImportProgressTracker`]; any other
//! process reads the same `import_progress` row as an [`ImportRun`].

mod tracker;

pub use tracker::ImportProgressTracker;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an import run. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-step tallies kept in the `step_details` JSON column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDetail {
    pub label: String,
    pub index: usize,
    pub completed: bool,
    pub processed: u64,
    pub total: Option<u64>,
    pub imported: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

/// Polling read model of one import attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRun {
    pub import_id: String,
    pub status: RunStatus,
    pub current_step: Option<String>,
    pub current_step_index: usize,
    pub total_steps: usize,
    pub current_step_processed: u64,
    pub current_step_total: Option<u64>,
    pub last_detail_message: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub step_details: Vec<StepDetail>,
}

impl ImportRun {
    pub fn new(import_id: impl Into<String>, total_steps: usize, started_at: String) -> Self {
        Self {
            import_id: import_id.into(),
            status: RunStatus::Running,
            current_step: None,
            current_step_index: 0,
            total_steps,
            current_step_processed: 0,
            current_step_total: None,
            last_detail_message: None,
            error_message: None,
            started_at: Some(started_at),
            completed_at: None,
            step_details: Vec::new(),
        }
    }

    pub fn step(&self, label: &str) -> Option<&StepDetail> {
        self.step_details.iter().find(|s| s.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            assert_eq!(RunStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RunStatus::parse("paused"), None);
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn test_read_model_serializes_camel_case() {
        let mut run = ImportRun::new("abc", 7, "2026-01-01T00:00:00+00:00".into());
        run.current_step = Some("Moves".into());
        run.current_step_total = Some(4);
        run.current_step_processed = 1;

        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["currentStep"], "Moves");
        assert_eq!(json["currentStepProcessed"], 1);
        assert_eq!(json["currentStepTotal"], 4);
        assert_eq!(json["completedAt"], serde_json::Value::Null);
    }
}
