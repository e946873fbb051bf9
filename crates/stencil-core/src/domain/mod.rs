// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Stencil.
//!
//! This module contains pure logic with no I/O. Filesystem access and
//! process execution are handled via ports (traits) defined in the
//! application layer.
//!
//! - **No I/O**: insertion, rendering and recipe building are pure functions
//! - **Immutable steps**: a [`Step`] never changes after construction
//! - **Append-only log**: [`ExecutionLog`] only grows

pub mod error;
pub mod insertion;
pub mod log;
pub mod paths;
pub mod recipe;
pub mod render;
pub mod step;

mod validation;

pub use error::{DomainError, ErrorCategory};
pub use insertion::{Anchor, InsertionSpec, Position, insert};
pub use log::{ExecutionLog, FailureKind, LogEntry, Outcome, StepFailure};
pub use recipe::{
    DEPENDENCY_MANIFEST, Feature, RecipeOptions, build_recipe, parse_framework_version,
};
pub use render::render;
pub use step::{ActionKind, CommandPurpose, Dependency, Step, StepAction, WritePolicy};
pub use validation::DomainValidator;
