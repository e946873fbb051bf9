//! Application layer for Stencil.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (StepExecutor, FrameworkProbe)
//! - **Context**: Per-run state (working dir, dry-run, cancellation, log)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. Insertion and recipe rules live in `crate::domain`.

pub mod context;
pub mod error;
pub mod ports;
pub mod services;

pub use context::{CancellationToken, ExecutionContext};
pub use services::{ExecutorOptions, FrameworkProbe, StepExecutor};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, Invocation, Tool, ToolOutput, ToolProvider};

pub use error::ApplicationError;
