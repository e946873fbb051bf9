//! Implementation of the `stencil apply` command.
//!
//! Responsibility: resolve the recipe, confirm with the user, wire the real
//! adapters into the core executor, and report the execution log. No
//! business logic lives here.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use stencil_adapters::{LocalFilesystem, SystemTools};
use stencil_core::application::{
    ApplicationError, CancellationToken, ExecutionContext, ExecutorOptions, StepExecutor,
};

use crate::{
    cli::ApplyArgs,
    commands::{Probing, ResolvedRecipe, resolve_recipe},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `stencil apply` command.
///
/// 1. Resolve directory and steps
/// 2. Confirm unless `--yes`, `--quiet`, `--dry-run` or stdin is not a TTY
/// 3. Install the Ctrl-C handler
/// 4. Run the steps and render the log
/// 5. Turn the first failure (or a cancellation) into exit code 5
#[instrument(skip_all, fields(dir = %args.recipe.dir.display()))]
pub fn execute(
    args: ApplyArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let probing = if args.dry_run {
        Probing::Forbidden
    } else {
        Probing::Allowed
    };
    let recipe = resolve_recipe(&args.recipe, &config, probing)?;

    let interactive = io::stdin().is_terminal();
    if interactive && !output.is_quiet() && !args.yes && !args.dry_run {
        output.render_plan(&recipe.name, recipe.description.as_deref(), &recipe.steps)?;
        output.print("")?;
        if !confirm(&recipe)? {
            return Err(CliError::Cancelled);
        }
    }

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Ctrl-C handler unavailable, run cannot be interrupted cleanly: {e}");
    }

    let options = executor_options(&args, &config);
    debug!(?options, "Executor configured");
    let executor = StepExecutor::new(
        Box::new(LocalFilesystem::new()),
        Box::new(SystemTools::new()),
        options,
    );
    let ctx = ExecutionContext::new(recipe.dir.clone())
        .with_dry_run(args.dry_run)
        .with_cancellation(token);

    output.header(&format!(
        "Applying '{}' to {}{}",
        recipe.name,
        recipe.dir.display(),
        if args.dry_run { " (dry run)" } else { "" }
    ))?;
    info!(recipe = %recipe.name, steps = recipe.steps.len(), "Apply started");

    let log = executor.run_validated(&recipe.steps, ctx)?;
    output.render_log(&log)?;

    if let Some(err) = ApplicationError::from_log(&log) {
        return Err(CliError::Core(err.into()));
    }

    info!(recipe = %recipe.name, "Apply completed");
    output.success(&format!("Recipe '{}' applied", recipe.name))?;
    Ok(())
}

/// `--continue-on-error` always wins; otherwise the config decides.
fn executor_options(args: &ApplyArgs, config: &AppConfig) -> ExecutorOptions {
    ExecutorOptions {
        fail_fast: !args.continue_on_error && config.executor.fail_fast,
        timeout: args
            .timeout
            .or(config.executor.timeout_secs)
            .map(Duration::from_secs),
        ..ExecutorOptions::default()
    }
}

fn confirm(recipe: &ResolvedRecipe) -> CliResult<bool> {
    print!(
        "Apply {} step(s) to {}? [Y/n] ",
        recipe.steps.len(),
        recipe.dir.display()
    );
    io::stdout().flush().map_err(|e| CliError::IoError {
        message: "failed to flush stdout".into(),
        source: e,
    })?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| CliError::IoError {
            message: "failed to read confirmation input".into(),
            source: e,
        })?;

    let input = input.trim().to_ascii_lowercase();
    Ok(input.is_empty() || input == "y" || input == "yes")
}
