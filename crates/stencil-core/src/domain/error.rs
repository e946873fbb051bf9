// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (recorded into execution logs)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Insertion / Rendering
    // ========================================================================
    #[error("Anchor not found: {anchor:?}")]
    AnchorNotFound { anchor: String },

    #[error("Invalid anchor pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Missing template parameter: {name}")]
    MissingParameter { name: String },

    // ========================================================================
    // Step validation
    // ========================================================================
    #[error("Invalid step '{step}': {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("Duplicate step name: {name}")]
    DuplicateStepName { name: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path leaves the application directory: {path}")]
    PathEscapesApp { path: String },

    #[error("Recipe has no steps")]
    EmptyRecipe,

    // ========================================================================
    // Recipe options
    // ========================================================================
    #[error("Invalid application name '{name}': {reason}")]
    InvalidAppName { name: String, reason: String },

    #[error("Unrecognized framework version output: {output:?}")]
    UnrecognizedVersion { output: String },

    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AnchorNotFound { anchor } => vec![
                format!("The target file no longer contains {:?}", anchor),
                "The generated scaffold may differ from what the recipe expects".into(),
            ],
            Self::MissingParameter { name } => vec![
                format!("Supply a value for '{}'", name),
            ],
            Self::InvalidAppName { .. } => vec![
                "Use letters, digits, hyphens and underscores".into(),
                "Pass --app-name explicitly".into(),
            ],
            Self::UnrecognizedVersion { .. } => vec![
                "Pass the version explicitly, e.g. --framework-version 7.1".into(),
            ],
            Self::UnknownFeature(_) => vec![
                "Known features: uuid, jobs, mail, css, procfile, ignore, git".into(),
            ],
            Self::EmptyRecipe => vec!["Add at least one [[steps]] entry".into()],
            Self::AbsolutePathNotAllowed { .. } | Self::PathEscapesApp { .. } => vec![
                "Step paths are relative to the application directory".into(),
                "Remove leading '/' and any '..' components".into(),
            ],
            _ => vec!["Check the recipe definition".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AnchorNotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidPattern { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidStep { .. }
            | Self::DuplicateStepName { .. }
            | Self::AbsolutePathNotAllowed { .. }
            | Self::PathEscapesApp { .. }
            | Self::EmptyRecipe
            | Self::InvalidAppName { .. }
            | Self::UnrecognizedVersion { .. }
            | Self::UnknownFeature(_) => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
}
