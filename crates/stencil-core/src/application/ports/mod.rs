//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `stencil-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `Tool` / `ToolProvider`: External programs (package manager, generators, git)

pub mod output;

pub use output::{Filesystem, Invocation, Tool, ToolOutput, ToolProvider};

#[cfg(test)]
pub use output::{MockFilesystem, MockToolProvider};
