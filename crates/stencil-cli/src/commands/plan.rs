//! `stencil plan`: print the ordered steps, execute nothing.

use tracing::instrument;

use crate::{
    cli::PlanArgs,
    commands::{Probing, resolve_recipe},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(dir = %args.recipe.dir.display()))]
pub fn execute(args: PlanArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let recipe = resolve_recipe(&args.recipe, &config, Probing::Forbidden)?;
    output.render_plan(&recipe.name, recipe.description.as_deref(), &recipe.steps)?;
    Ok(())
}
