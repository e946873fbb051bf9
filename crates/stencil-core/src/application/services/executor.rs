//! Step Executor - runs a recipe against a working directory.
//!
//! Steps run strictly in order on the calling thread, because later steps
//! read files that earlier steps create. Each step becomes one
//! [`LogEntry`]; with `fail_fast` the first failure ends the run.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, instrument, warn};

use crate::{
    application::{
        ApplicationError, ExecutionContext,
        ports::{Filesystem, Invocation, ToolProvider},
    },
    domain::{
        CommandPurpose, DEPENDENCY_MANIFEST, Dependency, DomainValidator, ExecutionLog,
        FailureKind, InsertionSpec, LogEntry, Outcome, Step, StepAction, StepFailure, WritePolicy,
        insert, paths, step::command_line,
    },
    error::{StencilError, StencilResult},
};

/// Anchor in `config/application.rb` that app-wide settings follow.
const APPLICATION_ANCHOR: &str = "class Application < Rails::Application\n";
/// Anchor in `config/environments/<env>.rb` that per-environment settings follow.
const ENVIRONMENT_ANCHOR: &str = "Rails.application.configure do\n";

/// Executor behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Stop at the first failed step.
    pub fail_fast: bool,
    /// Kill commands that run longer than this.
    pub timeout: Option<Duration>,
    /// Manifest file `AddDependency` appends to, relative to the working dir.
    pub dependency_manifest: PathBuf,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            fail_fast: true,
            timeout: None,
            dependency_manifest: PathBuf::from(DEPENDENCY_MANIFEST),
        }
    }
}

/// Runs steps through the injected filesystem and tool ports.
pub struct StepExecutor {
    filesystem: Box<dyn Filesystem>,
    tools: Box<dyn ToolProvider>,
    options: ExecutorOptions,
}

impl StepExecutor {
    pub fn new(
        filesystem: Box<dyn Filesystem>,
        tools: Box<dyn ToolProvider>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            filesystem,
            tools,
            options,
        }
    }

    /// Validate the whole list, then [`run`](Self::run) it.
    pub fn run_validated(
        &self,
        steps: &[Step],
        ctx: ExecutionContext,
    ) -> StencilResult<ExecutionLog> {
        DomainValidator::validate_steps(steps)?;
        Ok(self.run(steps, ctx))
    }

    /// Execute `steps` in order and return the finished log.
    #[instrument(
        skip_all,
        fields(
            steps = steps.len(),
            dir = %ctx.working_dir().display(),
            dry_run = ctx.is_dry_run(),
            fail_fast = self.options.fail_fast
        )
    )]
    pub fn run(&self, steps: &[Step], mut ctx: ExecutionContext) -> ExecutionLog {
        for step in steps {
            if ctx.cancellation().is_cancelled() {
                warn!(next = step.name(), "Run cancelled before step");
                ctx.mark_cancelled();
                break;
            }

            let span = info_span!("step", step = step.name(), action = %step.kind());
            let _enter = span.enter();

            let started = Instant::now();
            let dry_run = ctx.is_dry_run();
            let outcome = if dry_run {
                debug!(params = ?step.parameters(), "Dry run: not executing");
                Outcome::Success
            } else {
                match self.execute(step, &ctx) {
                    Ok(()) => Outcome::Success,
                    Err(failure) => Outcome::Failure(failure),
                }
            };

            let failed = match &outcome {
                Outcome::Success => {
                    info!("Step succeeded");
                    false
                }
                Outcome::Failure(f) => {
                    warn!(kind = %f.kind, reason = %f.reason, "Step failed");
                    true
                }
            };

            ctx.record(LogEntry::new(step, outcome, started.elapsed(), dry_run));

            if failed && self.options.fail_fast {
                info!("Fail-fast: remaining steps skipped");
                break;
            }
        }

        let log = ctx.into_log();
        info!(
            succeeded = log.succeeded(),
            failed = log.failed(),
            cancelled = log.was_cancelled(),
            "Run finished"
        );
        log
    }

    // -------------------------------------------------------------------------
    // Step functions
    // -------------------------------------------------------------------------

    fn execute(&self, step: &Step, ctx: &ExecutionContext) -> Result<(), StepFailure> {
        match step.action() {
            StepAction::WriteFile {
                path,
                content,
                policy,
            } => self.write_file(ctx, path, content, *policy)?,
            StepAction::InsertText(spec) => self.insert_text(ctx, spec)?,
            StepAction::AppendEnv {
                environment,
                snippet,
            } => self.append_env(ctx, environment.as_deref(), snippet)?,
            StepAction::AddDependency(dep) => self.add_dependency(ctx, dep)?,
            StepAction::RunCommand {
                program,
                args,
                purpose,
            } => self.run_command(ctx, program, args, *purpose)?,
        }
        Ok(())
    }

    fn write_file(
        &self,
        ctx: &ExecutionContext,
        path: &Path,
        content: &str,
        policy: WritePolicy,
    ) -> StencilResult<()> {
        let target = self.resolve_target(ctx, path)?;

        if policy == WritePolicy::CreateOnly && self.filesystem.exists(&target) {
            return Err(ApplicationError::FileConflict { path: target }.into());
        }

        if let Some(parent) = target.parent() {
            self.filesystem.create_dir_all(parent)?;
        }
        self.filesystem.write_file(&target, content)?;
        debug!(path = %target.display(), bytes = content.len(), "File written");
        Ok(())
    }

    fn insert_text(&self, ctx: &ExecutionContext, spec: &InsertionSpec) -> StencilResult<()> {
        let target = self.resolve_target(ctx, &spec.target_path)?;
        if !self.filesystem.exists(&target) {
            return Err(ApplicationError::FileNotFound { path: target }.into());
        }

        let contents = self.filesystem.read_file(&target)?;
        // On AnchorNotFound nothing is written.
        let updated = insert(&contents, spec)?;
        self.filesystem.write_file(&target, &updated)?;
        debug!(path = %target.display(), anchor = %spec.anchor, "Text inserted");
        Ok(())
    }

    fn append_env(
        &self,
        ctx: &ExecutionContext,
        environment: Option<&str>,
        snippet: &str,
    ) -> StencilResult<()> {
        let spec = environment_insertion(environment, snippet);
        self.insert_text(ctx, &spec)
    }

    fn add_dependency(&self, ctx: &ExecutionContext, dep: &Dependency) -> StencilResult<()> {
        let manifest = ctx.resolve(&self.options.dependency_manifest);
        if !self.filesystem.exists(&manifest) {
            return Err(ApplicationError::ManifestMissing { path: manifest }.into());
        }

        let mut contents = self.filesystem.read_file(&manifest)?;
        if !contents.is_empty() && !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&dep.manifest_line());
        contents.push('\n');

        self.filesystem.write_file(&manifest, &contents)?;
        debug!(dependency = %dep.name, "Dependency declared");
        Ok(())
    }

    fn run_command(
        &self,
        ctx: &ExecutionContext,
        program: &str,
        args: &[String],
        purpose: CommandPurpose,
    ) -> Result<(), StepFailure> {
        let tool = self.tools.tool(program)?;
        let invocation = Invocation {
            args: args.to_vec(),
            working_dir: ctx.working_dir().to_path_buf(),
            timeout: self.options.timeout,
        };

        let line = command_line(program, args);
        debug!(command = %line, "Invoking tool");
        let output = tool.invoke(&invocation)?;

        if output.success() {
            debug!(stdout = %output.stdout.trim_end(), "Command succeeded");
            return Ok(());
        }

        let kind = match purpose {
            CommandPurpose::General => FailureKind::CommandFailed,
            CommandPurpose::InstallDependencies => FailureKind::DependencyUnavailable,
        };
        let status = output
            .exit_code
            .map_or_else(|| "was terminated by a signal".to_string(), |c| format!("exited with status {c}"));
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim()
        } else {
            output.stderr.trim()
        };

        let reason = if detail.is_empty() {
            format!("`{line}` {status}")
        } else {
            format!("`{line}` {status}: {detail}")
        };
        Err(StepFailure::new(kind, reason))
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    /// Absolute path for a step path, resolving a wildcard file name against
    /// the files currently on disk.
    fn resolve_target(&self, ctx: &ExecutionContext, path: &Path) -> StencilResult<PathBuf> {
        if !paths::is_wildcard(path) {
            return Ok(ctx.resolve(path));
        }

        let (dir, pattern) = paths::split(path);
        let dir = ctx.resolve(&dir);
        if !self.filesystem.exists(&dir) {
            return Err(ApplicationError::FileNotFound { path: dir }.into());
        }

        let names = self.filesystem.list_files(&dir)?;
        paths::pick_match(&pattern, names.iter().map(String::as_str))
            .map(|name| dir.join(name))
            .ok_or_else(|| {
                StencilError::from(ApplicationError::FileNotFound {
                    path: ctx.resolve(path),
                })
            })
    }
}

/// The insertion an environment-config snippet turns into.
fn environment_insertion(environment: Option<&str>, snippet: &str) -> InsertionSpec {
    let (path, anchor, indent) = match environment {
        None => (
            PathBuf::from("config/application.rb"),
            APPLICATION_ANCHOR,
            "    ",
        ),
        Some(env) => (
            PathBuf::from(format!("config/environments/{env}.rb")),
            ENVIRONMENT_ANCHOR,
            "  ",
        ),
    };

    let mut body = String::new();
    for line in snippet.lines() {
        if !line.trim().is_empty() {
            body.push_str(indent);
        }
        body.push_str(line);
        body.push('\n');
    }

    InsertionSpec::after(path, anchor, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        CancellationToken,
        ports::{MockFilesystem, MockToolProvider, Tool, ToolOutput},
    };
    use std::sync::{Arc, Mutex};

    /// Tool that always exits with `code` and remembers its invocations.
    struct FixedTool {
        code: Option<i32>,
        stderr: String,
        calls: Mutex<Vec<Invocation>>,
    }

    impl FixedTool {
        fn exiting(code: i32, stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                code: Some(code),
                stderr: stderr.into(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Tool for FixedTool {
        fn name(&self) -> &str {
            "fixed"
        }

        fn invoke(&self, invocation: &Invocation) -> StencilResult<ToolOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            Ok(ToolOutput {
                exit_code: self.code,
                stdout: String::new(),
                stderr: self.stderr.clone(),
            })
        }
    }

    fn provider_for(tool: &Arc<FixedTool>) -> MockToolProvider {
        let tool = Arc::clone(tool);
        let mut provider = MockToolProvider::new();
        provider
            .expect_tool()
            .returning(move |_| Ok(Arc::clone(&tool) as Arc<dyn Tool>));
        provider
    }

    fn executor(provider: MockToolProvider, options: ExecutorOptions) -> StepExecutor {
        StepExecutor::new(Box::new(MockFilesystem::new()), Box::new(provider), options)
    }

    #[test]
    fn non_zero_exit_is_command_failed_and_stops_run() {
        let tool = FixedTool::exiting(1, "boom\n");
        let exec = executor(provider_for(&tool), ExecutorOptions::default());
        let steps = vec![
            Step::run_command("first", "false", Vec::<String>::new()),
            Step::run_command("second", "true", Vec::<String>::new()),
        ];

        let log = exec.run(&steps, ExecutionContext::new("/app"));

        assert_eq!(log.len(), 1);
        let (entry, failure) = log.first_failure().unwrap();
        assert_eq!(entry.step, "first");
        assert_eq!(failure.kind, FailureKind::CommandFailed);
        assert_eq!(failure.reason, "`false` exited with status 1: boom");
        assert_eq!(tool.calls().len(), 1);
    }

    #[test]
    fn continue_on_error_runs_remaining_steps() {
        let tool = FixedTool::exiting(2, "");
        let options = ExecutorOptions {
            fail_fast: false,
            ..ExecutorOptions::default()
        };
        let exec = executor(provider_for(&tool), options);
        let steps = vec![
            Step::run_command("a", "x", Vec::<String>::new()),
            Step::run_command("b", "y", Vec::<String>::new()),
        ];

        let log = exec.run(&steps, ExecutionContext::new("/app"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.failed(), 2);
    }

    #[test]
    fn failed_install_is_dependency_unavailable() {
        let tool = FixedTool::exiting(7, "Could not fetch specs");
        let exec = executor(provider_for(&tool), ExecutorOptions::default());
        let steps = vec![Step::install_dependencies("bundle", "bundle", ["install"])];

        let log = exec.run(&steps, ExecutionContext::new("/app"));
        let (_, failure) = log.first_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::DependencyUnavailable);
    }

    #[test]
    fn invocation_carries_args_dir_and_timeout() {
        let tool = FixedTool::exiting(0, "");
        let options = ExecutorOptions {
            timeout: Some(Duration::from_secs(9)),
            ..ExecutorOptions::default()
        };
        let exec = executor(provider_for(&tool), options);
        let steps = vec![Step::run_command("git add", "git", ["add", "-A"])];

        let log = exec.run(&steps, ExecutionContext::new("/srv/blog"));

        assert!(log.is_success());
        let calls = tool.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["add".to_string(), "-A".to_string()]);
        assert_eq!(calls[0].working_dir, PathBuf::from("/srv/blog"));
        assert_eq!(calls[0].timeout, Some(Duration::from_secs(9)));
    }

    #[test]
    fn unavailable_tool_is_command_failed() {
        let mut provider = MockToolProvider::new();
        provider.expect_tool().returning(|program| {
            Err(ApplicationError::ToolUnavailable {
                program: program.to_string(),
                reason: "not found in PATH".into(),
            }
            .into())
        });
        let exec = executor(provider, ExecutorOptions::default());
        let steps = vec![Step::run_command("yarn", "yarn", ["install"])];

        let log = exec.run(&steps, ExecutionContext::new("/app"));
        let (_, failure) = log.first_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::CommandFailed);
        assert!(failure.reason.contains("not found in PATH"));
    }

    #[test]
    fn dry_run_touches_nothing() {
        // Mocks without expectations panic if called.
        let exec = executor(MockToolProvider::new(), ExecutorOptions::default());
        let steps = vec![
            Step::write_file("w", "Procfile.dev", "web: start\n"),
            Step::run_command("r", "git", ["status"]),
        ];

        let log = exec.run(&steps, ExecutionContext::new("/app").with_dry_run(true));
        assert_eq!(log.len(), 2);
        assert!(log.is_success());
        assert!(log.entries().iter().all(|e| e.dry_run));
    }

    #[test]
    fn cancellation_is_checked_before_each_step() {
        let token = CancellationToken::new();
        token.cancel();
        let exec = executor(MockToolProvider::new(), ExecutorOptions::default());
        let steps = vec![Step::run_command("r", "git", ["status"])];

        let ctx = ExecutionContext::new("/app").with_cancellation(token);
        let log = exec.run(&steps, ctx);
        assert!(log.is_empty());
        assert!(log.was_cancelled());
    }

    #[test]
    fn run_validated_rejects_invalid_steps() {
        let exec = executor(MockToolProvider::new(), ExecutorOptions::default());
        let steps = vec![Step::write_file("abs", "/etc/hosts", "")];
        assert!(
            exec.run_validated(&steps, ExecutionContext::new("/app"))
                .is_err()
        );
    }

    #[test]
    fn application_wide_env_goes_into_application_rb() {
        let spec = environment_insertion(None, "config.a = 1\nconfig.b = 2");
        assert_eq!(spec.target_path, PathBuf::from("config/application.rb"));
        assert_eq!(spec.anchor.as_str(), APPLICATION_ANCHOR);
        assert_eq!(spec.snippet, "    config.a = 1\n    config.b = 2\n");
    }

    #[test]
    fn per_environment_env_goes_into_environment_file() {
        let spec = environment_insertion(Some("development"), "config.x = 1\n\nconfig.y = 2");
        assert_eq!(
            spec.target_path,
            PathBuf::from("config/environments/development.rb")
        );
        assert_eq!(spec.snippet, "  config.x = 1\n\n  config.y = 2\n");
    }
}
