//! Explicit per-run state passed to every step.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::{ExecutionLog, LogEntry};

/// Cooperative cancellation flag shared between the runner and a signal
/// handler. Checked only between steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Working directory, dry-run flag, cancellation and the accumulated log.
#[derive(Debug)]
pub struct ExecutionContext {
    working_dir: PathBuf,
    dry_run: bool,
    cancellation: CancellationToken,
    log: ExecutionLog,
}

impl ExecutionContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            dry_run: false,
            cancellation: CancellationToken::new(),
            log: ExecutionLog::new(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolve a step-relative path against the working directory.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.working_dir.join(relative)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    pub(crate) fn record(&mut self, entry: LogEntry) {
        self.log.record(entry);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.log.mark_cancelled();
    }

    pub fn into_log(self) -> ExecutionLog {
        self.log
    }
}
