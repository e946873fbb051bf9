//! Scripted tools for tests and rehearsals.
//!
//! Each program is bound to a handler that produces a [`ToolOutput`]. Every
//! invocation is recorded so tests can assert on the exact command sequence.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stencil_core::{
    application::{
        ApplicationError,
        ports::{Invocation, Tool, ToolOutput, ToolProvider},
    },
    error::StencilResult,
};

type Handler = Arc<dyn Fn(&Invocation) -> StencilResult<ToolOutput> + Send + Sync>;

/// A recorded call: program name plus the invocation it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub invocation: Invocation,
}

impl RecordedCall {
    /// `program arg1 arg2`, for compact assertions.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.invocation.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// [`ToolProvider`] with canned behaviour per program.
///
/// Programs without a handler are unavailable, like a missing binary.
#[derive(Clone, Default)]
pub struct ScriptedTools {
    handlers: HashMap<String, Handler>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// `program` exits 0 with no output.
    pub fn succeed(self, program: &str) -> Self {
        self.exit(program, 0, "")
    }

    /// `program` exits with `code`, writing `stderr`.
    pub fn exit(self, program: &str, code: i32, stderr: &str) -> Self {
        let stderr = stderr.to_string();
        self.on(program, move |_| {
            Ok(ToolOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: stderr.clone(),
            })
        })
    }

    /// Run `handler` whenever `program` is invoked.
    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> StencilResult<ToolOutput> + Send + Sync + 'static,
    {
        self.handlers.insert(program.to_string(), Arc::new(handler));
        self
    }

    /// Every invocation so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Recorded calls as `program args…` strings.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::command_line).collect()
    }
}

impl std::fmt::Debug for ScriptedTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut programs: Vec<_> = self.handlers.keys().collect();
        programs.sort();
        f.debug_struct("ScriptedTools")
            .field("programs", &programs)
            .finish_non_exhaustive()
    }
}

impl ToolProvider for ScriptedTools {
    fn tool(&self, program: &str) -> StencilResult<Arc<dyn Tool>> {
        let handler = self
            .handlers
            .get(program)
            .cloned()
            .ok_or_else(|| ApplicationError::ToolUnavailable {
                program: program.to_string(),
                reason: "no scripted handler".into(),
            })?;

        Ok(Arc::new(ScriptedTool {
            name: program.to_string(),
            handler,
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// One scripted program handed out by [`ScriptedTools`].
pub struct ScriptedTool {
    name: String,
    handler: Handler,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, invocation: &Invocation) -> StencilResult<ToolOutput> {
        self.calls
            .lock()
            .map_err(|_| ApplicationError::LockPoisoned)?
            .push(RecordedCall {
                program: self.name.clone(),
                invocation: invocation.clone(),
            });
        (self.handler)(invocation)
    }
}
