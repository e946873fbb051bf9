//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ExecutionLog;
use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// A file that must exist does not.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Only-create write hit an existing file.
    #[error("File already exists: {path}")]
    FileConflict { path: PathBuf },

    /// Dependency manifest is missing from the working directory.
    #[error("Dependency manifest not found: {path}")]
    ManifestMissing { path: PathBuf },

    /// The external program could not be located or started.
    #[error("Tool '{program}' is unavailable: {reason}")]
    ToolUnavailable { program: String, reason: String },

    /// The external program ran longer than the configured timeout.
    #[error("'{program}' timed out after {seconds}s")]
    CommandTimedOut { program: String, seconds: u64 },

    /// A recipe step failed; carries the first failure of a run.
    #[error("Step '{step}' failed ({kind}): {reason}")]
    StepFailed {
        step: String,
        kind: String,
        reason: String,
    },

    /// The run was cancelled between steps.
    #[error("Run cancelled after {completed} step(s)")]
    Cancelled { completed: usize },

    /// A recipe file could not be read or parsed.
    #[error("Invalid recipe {path}: {reason}")]
    RecipeLoad { path: PathBuf, reason: String },

    /// Shared state lock poisoned.
    #[error("Internal lock poisoned")]
    LockPoisoned,
}

impl ApplicationError {
    /// The error a finished run amounts to, if any: cancellation first, then
    /// the first failed step.
    pub fn from_log(log: &ExecutionLog) -> Option<Self> {
        if log.was_cancelled() {
            return Some(Self::Cancelled {
                completed: log.len(),
            });
        }
        log.first_failure().map(|(entry, failure)| Self::StepFailed {
            step: entry.step.clone(),
            kind: failure.kind.to_string(),
            reason: failure.reason.clone(),
        })
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::FileNotFound { path } => vec![
                format!("Expected {} to exist", path.display()),
                "Run stencil inside a generated application directory".into(),
            ],
            Self::FileConflict { path } => vec![
                format!("Remove {} or switch the step to overwrite", path.display()),
            ],
            Self::ManifestMissing { path } => vec![
                format!("No {} found in the target directory", path.display()),
                "Run stencil inside a generated application directory".into(),
            ],
            Self::ToolUnavailable { program, .. } => vec![
                format!("Ensure '{}' is installed and in your PATH", program),
            ],
            Self::CommandTimedOut { .. } => vec![
                "Increase --timeout or run the command manually".into(),
            ],
            Self::StepFailed { step, .. } => vec![
                format!("Fix the cause and re-run; '{}' and later steps did not complete", step),
                "Steps are not idempotent: restore the directory (e.g. git checkout .) before re-running".into(),
                "Use --continue-on-error to run independent steps anyway".into(),
            ],
            Self::Cancelled { .. } => vec![
                "Completed steps were not rolled back".into(),
            ],
            Self::RecipeLoad { path, .. } => vec![
                format!("Check the syntax of {}", path.display()),
            ],
            Self::LockPoisoned => vec!["Try again".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilesystemError { .. } | Self::LockPoisoned => ErrorCategory::Internal,
            Self::FileNotFound { .. } | Self::ManifestMissing { .. } => ErrorCategory::NotFound,
            Self::ToolUnavailable { .. } => ErrorCategory::NotFound,
            Self::FileConflict { .. } => ErrorCategory::Validation,
            Self::CommandTimedOut { .. } | Self::StepFailed { .. } => ErrorCategory::Execution,
            Self::Cancelled { .. } => ErrorCategory::Execution,
            Self::RecipeLoad { .. } => ErrorCategory::Validation,
        }
    }
}
