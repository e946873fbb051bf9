//! Detects the framework version installed in a target application.

use std::path::Path;

use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{Invocation, ToolProvider},
    },
    domain::parse_framework_version,
    error::StencilResult,
};

/// Asks the application's own binstub which framework version it runs.
pub struct FrameworkProbe<'a> {
    tools: &'a dyn ToolProvider,
}

impl<'a> FrameworkProbe<'a> {
    const PROGRAM: &'static str = "bin/rails";
    const ARGS: [&'static str; 1] = ["-v"];

    pub fn new(tools: &'a dyn ToolProvider) -> Self {
        Self { tools }
    }

    /// `major.minor` of the framework, e.g. `"7.1"`.
    #[instrument(skip(self), fields(dir = %working_dir.display()))]
    pub fn detect(&self, working_dir: &Path) -> StencilResult<String> {
        let tool = self.tools.tool(Self::PROGRAM)?;
        let output = tool.invoke(&Invocation {
            args: Self::ARGS.iter().map(|a| a.to_string()).collect(),
            working_dir: working_dir.to_path_buf(),
            timeout: None,
        })?;

        if !output.success() {
            return Err(ApplicationError::ToolUnavailable {
                program: Self::PROGRAM.into(),
                reason: format!("`bin/rails -v` failed: {}", output.stderr.trim()),
            }
            .into());
        }

        let version = parse_framework_version(&output.stdout)?;
        debug!(%version, "Framework version detected");
        Ok(version)
    }
}
