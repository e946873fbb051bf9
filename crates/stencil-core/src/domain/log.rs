//! Execution log: the append-only record of a run.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::step::{ActionKind, Step};

/// Classification of a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Insertion target text is missing from the file.
    AnchorNotFound,
    /// External process exited non-zero, could not start, or timed out.
    CommandFailed,
    /// File exists where only-create was requested.
    FileConflict,
    /// Dependency manifest missing or package installation failed.
    DependencyUnavailable,
    /// Any other filesystem failure.
    Io,
}

impl FailureKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AnchorNotFound => "anchor not found",
            Self::CommandFailed => "command failed",
            Self::FileConflict => "file conflict",
            Self::DependencyUnavailable => "dependency unavailable",
            Self::Io => "i/o error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl StepFailure {
    pub fn new(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure(StepFailure),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub step: String,
    pub action: ActionKind,
    pub outcome: Outcome,
    pub duration_ms: u64,
    /// Recorded without touching the filesystem or running tools.
    pub dry_run: bool,
}

impl LogEntry {
    pub fn new(step: &Step, outcome: Outcome, duration: Duration, dry_run: bool) -> Self {
        Self {
            step: step.name().to_string(),
            action: step.kind(),
            outcome,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            dry_run,
        }
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        match &self.outcome {
            Outcome::Failure(f) => Some(f),
            Outcome::Success => None,
        }
    }
}

/// Ordered, append-only record of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    entries: Vec<LogEntry>,
    cancelled: bool,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            entries: Vec::new(),
            cancelled: false,
        }
    }

    pub fn record(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// First failed entry in execution order.
    pub fn first_failure(&self) -> Option<(&LogEntry, &StepFailure)> {
        self.entries
            .iter()
            .find_map(|e| e.failure().map(|f| (e, f)))
    }

    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// No failures and not cancelled.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.first_failure().is_none()
    }
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, outcome: Outcome) -> LogEntry {
        let step = Step::write_file(name, "x", "");
        LogEntry::new(&step, outcome, Duration::from_millis(3), false)
    }

    #[test]
    fn first_failure_is_in_order() {
        let mut log = ExecutionLog::new();
        log.record(entry("a", Outcome::Success));
        log.record(entry(
            "b",
            Outcome::Failure(StepFailure::new(FailureKind::CommandFailed, "exit 1")),
        ));
        log.record(entry(
            "c",
            Outcome::Failure(StepFailure::new(FailureKind::Io, "denied")),
        ));

        let (e, f) = log.first_failure().unwrap();
        assert_eq!(e.step, "b");
        assert_eq!(f.kind, FailureKind::CommandFailed);
        assert_eq!(log.succeeded(), 1);
        assert_eq!(log.failed(), 2);
        assert!(!log.is_success());
    }

    #[test]
    fn cancelled_log_is_not_success() {
        let mut log = ExecutionLog::new();
        log.record(entry("a", Outcome::Success));
        log.mark_cancelled();
        assert!(log.was_cancelled());
        assert!(!log.is_success());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::Failure(StepFailure::new(
            FailureKind::AnchorNotFound,
            "missing",
        )))
        .unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "anchor_not_found");
    }
}
