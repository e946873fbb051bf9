//! Stencil Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Stencil
//! recipe runner, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           stencil-cli (CLI)             │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │    (StepExecutor, FrameworkProbe)       │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │    (Driven: Filesystem, Tool)           │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stencil-adapters (Infrastructure)    │
//! │  (LocalFilesystem, SystemTools, etc)    │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (Step, insert, render, ExecutionLog)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stencil_core::prelude::*;
//!
//! # fn demo(filesystem: Box<dyn Filesystem>, tools: Box<dyn ToolProvider>) -> StencilResult<()> {
//! let options = RecipeOptions::new("blog", "7.1")?.skip(Feature::Git);
//! let steps = build_recipe(&options)?;
//!
//! let executor = StepExecutor::new(filesystem, tools, ExecutorOptions::default());
//! let log = executor.run(&steps, ExecutionContext::new("./blog"));
//! assert!(log.is_success());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod domain;
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        CancellationToken, ExecutionContext, ExecutorOptions, FrameworkProbe, StepExecutor,
        ports::{Filesystem, Invocation, Tool, ToolOutput, ToolProvider},
    };
    pub use crate::domain::{
        ActionKind, Anchor, CommandPurpose, Dependency, ExecutionLog, Feature, FailureKind,
        InsertionSpec, LogEntry, Outcome, Position, RecipeOptions, Step, StepAction,
        StepFailure, WritePolicy, build_recipe, insert, parse_framework_version, render,
    };
    pub use crate::error::{StencilError, StencilResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
