//! Unified error handling for Stencil Core.
//!
//! This module provides a unified error type that wraps domain and application
//! errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, FailureKind, StepFailure};

/// Root error type for Stencil Core operations.
///
/// This enum wraps all possible errors that can occur when using stencil-core,
/// providing a unified interface for error handling.
#[derive(Debug, Error, Clone)]
pub enum StencilError {
    /// Errors from the domain layer (business logic violations).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Errors from the application layer (orchestration failures).
    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),
}

impl StencilError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
                crate::domain::ErrorCategory::NotFound => ErrorCategory::NotFound,
            },
            Self::Application(e) => e.category(),
        }
    }

    /// The failure kind this error is recorded as in an execution log.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Domain(DomainError::AnchorNotFound { .. }) => FailureKind::AnchorNotFound,
            Self::Application(ApplicationError::FileConflict { .. }) => FailureKind::FileConflict,
            Self::Application(ApplicationError::ManifestMissing { .. }) => {
                FailureKind::DependencyUnavailable
            }
            Self::Application(
                ApplicationError::ToolUnavailable { .. }
                | ApplicationError::CommandTimedOut { .. },
            ) => FailureKind::CommandFailed,
            _ => FailureKind::Io,
        }
    }
}

impl From<StencilError> for StepFailure {
    fn from(err: StencilError) -> Self {
        let kind = err.failure_kind();
        let reason = match err {
            StencilError::Domain(e) => e.to_string(),
            StencilError::Application(e) => e.to_string(),
        };
        StepFailure::new(kind, reason)
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    /// A recipe step failed while executing.
    Execution,
    Internal,
}

/// Convenient result type alias.
pub type StencilResult<T> = Result<T, StencilError>;
