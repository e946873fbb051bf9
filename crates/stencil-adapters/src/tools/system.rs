//! Real external programs, spawned with `std::process`.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use stencil_core::{
    application::{
        ApplicationError,
        ports::{Invocation, Tool, ToolOutput, ToolProvider},
    },
    error::StencilResult,
};

/// How often a timed command is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Resolves programs from `PATH`.
///
/// Names containing a path separator (`bin/rails`) are not looked up; they
/// resolve against the invocation's working directory when run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTools;

impl SystemTools {
    pub fn new() -> Self {
        Self
    }
}

impl ToolProvider for SystemTools {
    fn tool(&self, program: &str) -> StencilResult<Arc<dyn Tool>> {
        if is_path_like(program) {
            return Ok(Arc::new(ProcessTool::relative(program)));
        }

        let resolved = which::which(program).map_err(|e| ApplicationError::ToolUnavailable {
            program: program.to_string(),
            reason: e.to_string(),
        })?;
        debug!(program, path = %resolved.display(), "Resolved tool");
        Ok(Arc::new(ProcessTool::resolved(program, resolved)))
    }
}

/// One spawnable program.
#[derive(Debug, Clone)]
pub struct ProcessTool {
    name: String,
    /// Absolute path from a `PATH` lookup; `None` for working-dir relative names.
    path: Option<PathBuf>,
}

impl ProcessTool {
    fn resolved(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            path: Some(path),
        }
    }

    fn relative(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
        }
    }

    fn executable(&self, working_dir: &Path) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => working_dir.join(&self.name),
        }
    }

    fn unavailable(&self, reason: impl ToString) -> ApplicationError {
        ApplicationError::ToolUnavailable {
            program: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

impl Tool for ProcessTool {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(program = %self.name, args = ?invocation.args))]
    fn invoke(&self, invocation: &Invocation) -> StencilResult<ToolOutput> {
        let executable = self.executable(&invocation.working_dir);

        let mut command = Command::new(&executable);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a timeout also reaches grandchildren.
            command.process_group(0);
        }
        let mut child = command.spawn().map_err(|e| self.unavailable(e))?;

        // Drain both pipes concurrently so a chatty child never blocks on a
        // full pipe while we wait for it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match invocation.timeout {
            None => child.wait().map_err(|e| self.unavailable(e))?,
            Some(limit) => match wait_with_deadline(&mut child, limit).map_err(|e| self.unavailable(e))? {
                Some(status) => status,
                None => {
                    warn!(seconds = limit.as_secs(), "Command timed out, killing it");
                    kill_tree(&mut child);
                    let _ = child.wait();
                    // A detached descendant may still hold the pipes; leave
                    // the drain threads to finish on their own.
                    drop((stdout, stderr));
                    return Err(ApplicationError::CommandTimedOut {
                        program: self.name.clone(),
                        seconds: limit.as_secs(),
                    }
                    .into());
                }
            },
        };

        let output = ToolOutput {
            exit_code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        debug!(exit_code = ?output.exit_code, "Command finished");
        Ok(output)
    }
}

fn is_path_like(program: &str) -> bool {
    program.contains('/') || program.contains(std::path::MAIN_SEPARATOR)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Kill the child's whole process group. The child may already have exited.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // process_group(0) made the group id equal to the child's pid.
    if let Ok(pgid) = i32::try_from(child.id()) {
        // SAFETY: kill(2) only sends a signal; a negative pid addresses the group.
        #[allow(unsafe_code)]
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc != 0 {
            debug!(error = %std::io::Error::last_os_error(), "Process group kill failed");
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// `Ok(None)` if the child is still running at the deadline.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
