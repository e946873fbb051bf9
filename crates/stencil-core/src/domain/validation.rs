use std::collections::HashSet;
use std::path::{Component, Path};

use crate::domain::{
    error::DomainError,
    paths,
    step::{Step, StepAction},
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    /// Validate a whole step list before anything runs.
    pub fn validate_steps(steps: &[Step]) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for step in steps {
            if !seen.insert(step.name()) {
                return Err(DomainError::DuplicateStepName {
                    name: step.name().to_string(),
                });
            }
            Self::validate_step(step)?;
        }
        Ok(())
    }

    pub fn validate_step(step: &Step) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidStep {
            step: step.name().to_string(),
            reason: reason.to_string(),
        };

        if step.name().trim().is_empty() {
            return Err(invalid("step name cannot be empty"));
        }

        match step.action() {
            StepAction::WriteFile { path, .. } => Self::validate_path(path),
            StepAction::InsertText(spec) => {
                Self::validate_path(&spec.target_path)?;
                if spec.anchor.as_str().is_empty() {
                    return Err(invalid("anchor cannot be empty"));
                }
                spec.anchor.check()
            }
            StepAction::AppendEnv { environment, .. } => match environment {
                Some(env) if env.is_empty() || env.contains(['/', '\\']) => {
                    Err(invalid("environment must be a plain name"))
                }
                _ => Ok(()),
            },
            StepAction::AddDependency(dep) => {
                if dep.name.trim().is_empty() {
                    return Err(invalid("dependency name cannot be empty"));
                }
                Ok(())
            }
            StepAction::RunCommand { program, .. } => {
                if program.trim().is_empty() {
                    return Err(invalid("program cannot be empty"));
                }
                Ok(())
            }
        }
    }

    fn validate_path(path: &Path) -> Result<(), DomainError> {
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidStep {
                step: path.display().to_string(),
                reason: "path cannot be empty".into(),
            });
        }
        if path.is_absolute() || path.has_root() {
            return Err(DomainError::AbsolutePathNotAllowed {
                path: path.display().to_string(),
            });
        }
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(DomainError::PathEscapesApp {
                path: path.display().to_string(),
            });
        }
        paths::validate_wildcard(path)
    }
}
