//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stencil-adapters` crate provides implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::StencilResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stencil_adapters::filesystem::LocalFilesystem` (production)
/// - `stencil_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> StencilResult<()>;

    /// Write content to a file, replacing what was there.
    fn write_file(&self, path: &Path, content: &str) -> StencilResult<()>;

    /// Read a whole UTF-8 file.
    fn read_file(&self, path: &Path) -> StencilResult<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// File names (not paths) of the regular files directly inside `dir`.
    fn list_files(&self, dir: &Path) -> StencilResult<Vec<String>>;
}

/// One request to run an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// What a finished process reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Port for an external program.
///
/// Implemented by:
/// - `stencil_adapters::tools::ProcessTool` (spawns a real process)
/// - `stencil_adapters::tools::ScriptedTool` (canned responses for tests)
pub trait Tool: Send + Sync {
    /// Program name as written in the step.
    fn name(&self) -> &str;

    /// Run to completion. A non-zero exit is `Ok` with that exit code;
    /// `Err` means the program could not be started or timed out.
    fn invoke(&self, invocation: &Invocation) -> StencilResult<ToolOutput>;
}

/// Port that resolves a program name to a [`Tool`].
#[cfg_attr(test, mockall::automock)]
pub trait ToolProvider: Send + Sync {
    fn tool(&self, program: &str) -> StencilResult<Arc<dyn Tool>>;
}
