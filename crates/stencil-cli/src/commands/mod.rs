//! Command handlers, one module per subcommand.
//!
//! `apply` and `plan` share [`resolve_recipe`], which turns the selection
//! flags plus config into a concrete directory and step list.

pub mod apply;
pub mod completions;
pub mod config;
pub mod init;
pub mod plan;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, instrument, warn};

use stencil_adapters::{RecipeLoader, SystemTools};
use stencil_core::{
    application::FrameworkProbe,
    domain::{Feature, RecipeOptions, Step, build_recipe},
};

use crate::{
    cli::RecipeArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
};

/// Name shown for the recipe compiled into the binary.
const BUILTIN_RECIPE: &str = "builtin";

/// A recipe ready to plan or run.
#[derive(Debug)]
pub struct ResolvedRecipe {
    pub name: String,
    pub description: Option<String>,
    /// Absolute application directory.
    pub dir: PathBuf,
    pub steps: Vec<Step>,
}

/// Whether resolving may run `bin/rails -v` to learn the framework version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probing {
    Allowed,
    /// `plan` and dry runs invoke no tools.
    Forbidden,
}

/// Resolve the application directory, recipe inputs and step list.
///
/// Flags win over config. The framework version is probed with
/// `bin/rails -v` only for the built-in recipe, only when neither the flag
/// nor the config supplies it, and only if `probing` allows it.
#[instrument(skip_all, fields(dir = %args.dir.display()))]
pub fn resolve_recipe(
    args: &RecipeArgs,
    config: &AppConfig,
    probing: Probing,
) -> CliResult<ResolvedRecipe> {
    let dir = resolve_dir(&args.dir)?;
    let app_name = resolve_app_name(args, config, &dir)?;
    let framework_version = args
        .framework_version
        .clone()
        .or_else(|| config.recipe.framework_version.clone());

    if let Some(path) = &args.recipe {
        if !config.recipe.skip.is_empty() {
            warn!(
                skip = ?config.recipe.skip,
                "recipe.skip only applies to the built-in recipe; ignored for {}",
                path.display()
            );
        }
        let mut loader = RecipeLoader::new(path).param("app_name", app_name.as_str());
        if let Some(version) = framework_version {
            loader = loader.param("framework_version", version);
        }
        let recipe = loader
            .load()
            .with_cli_context(|| format!("loading recipe {}", path.display()))?;
        debug!(recipe = %recipe.name, steps = recipe.steps.len(), "Custom recipe resolved");
        return Ok(ResolvedRecipe {
            name: recipe.name,
            description: recipe.description,
            dir,
            steps: recipe.steps,
        });
    }

    let framework_version = match (framework_version, probing) {
        (Some(version), _) => version,
        (None, Probing::Allowed) => FrameworkProbe::new(&SystemTools::new())
            .detect(&dir)
            .with_cli_context(|| "detecting framework version")?,
        (None, Probing::Forbidden) => {
            return Err(CliError::InvalidInput {
                message: "framework version unknown: plan and --dry-run do not run \
                          `bin/rails -v`; pass --framework-version or set \
                          recipe.framework_version"
                    .into(),
                source: None,
            });
        }
    };

    let mut skipped = args.skipped();
    skipped.extend(configured_skips(config)?);

    let options = RecipeOptions::new(&app_name, framework_version)
        .map_err(|e| CliError::Core(e.into()))?
        .skip_all(skipped);
    let steps = build_recipe(&options).map_err(|e| CliError::Core(e.into()))?;
    debug!(
        app = options.app_name(),
        version = options.framework_version(),
        steps = steps.len(),
        "Built-in recipe resolved"
    );

    Ok(ResolvedRecipe {
        name: BUILTIN_RECIPE.into(),
        description: None,
        dir,
        steps,
    })
}

fn resolve_dir(dir: &Path) -> CliResult<PathBuf> {
    if !dir.is_dir() {
        return Err(CliError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    dir.canonicalize()
        .with_cli_context(|| format!("resolving {}", dir.display()))
}

fn resolve_app_name(args: &RecipeArgs, config: &AppConfig, dir: &Path) -> CliResult<String> {
    if let Some(name) = args.app_name.clone().or_else(|| config.recipe.app_name.clone()) {
        return Ok(name);
    }
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::InvalidInput {
            message: format!(
                "cannot derive an application name from {}; pass --app-name",
                dir.display()
            ),
            source: None,
        })
}

fn configured_skips(config: &AppConfig) -> CliResult<Vec<Feature>> {
    config
        .recipe
        .skip
        .iter()
        .map(|name| {
            Feature::from_str(name).map_err(|e| CliError::ConfigError {
                message: format!("recipe.skip: {e}"),
                source: Some(Box::new(e)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    use crate::cli::{Cli, Commands};

    fn recipe_args(argv: &[&str]) -> RecipeArgs {
        let mut full = vec!["stencil", "plan"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Plan(args) => args.recipe,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_directory_is_not_found() {
        let args = recipe_args(&["/does/not/exist", "--framework-version", "7.1"]);
        assert!(matches!(
            resolve_recipe(&args, &AppConfig::default(), Probing::Forbidden),
            Err(CliError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn builtin_recipe_uses_directory_name() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("blog-app");
        std::fs::create_dir(&app).unwrap();
        let dir = app.to_string_lossy().into_owned();

        let args = recipe_args(&[&dir, "--framework-version", "7.1"]);
        let recipe = resolve_recipe(&args, &AppConfig::default(), Probing::Forbidden).unwrap();

        assert_eq!(recipe.name, BUILTIN_RECIPE);
        assert!(recipe.dir.is_absolute());
        assert!(recipe.steps.iter().any(|s| s.name().contains("sidekiq")));
    }

    #[test]
    fn config_skips_combine_with_flags() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_string_lossy().into_owned();
        let mut config = AppConfig::default();
        config.recipe.skip = vec!["git".into()];
        config.recipe.framework_version = Some("7.1".into());
        config.recipe.app_name = Some("blog".into());

        let args = recipe_args(&[&dir, "--skip-jobs"]);
        let recipe = resolve_recipe(&args, &config, Probing::Forbidden).unwrap();

        assert!(!recipe.steps.iter().any(|s| s.name().contains("sidekiq")));
        assert!(!recipe.steps.iter().any(|s| s.name().contains("commit")));
    }

    #[test]
    fn unknown_configured_skip_is_config_error() {
        let mut config = AppConfig::default();
        config.recipe.skip = vec!["webpack".into()];
        assert!(matches!(
            configured_skips(&config),
            Err(CliError::ConfigError { .. })
        ));
    }

    #[test]
    fn flag_app_name_wins_over_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_string_lossy().into_owned();
        let mut config = AppConfig::default();
        config.recipe.app_name = Some("from_config".into());

        let args = recipe_args(&[&dir, "--app-name", "from_flag"]);
        assert_eq!(
            resolve_app_name(&args, &config, temp.path()).unwrap(),
            "from_flag"
        );
    }

    #[test]
    fn custom_recipe_receives_params() {
        let temp = TempDir::new().unwrap();
        let recipe_path = temp.path().join("extras.toml");
        std::fs::write(
            &recipe_path,
            "[[steps]]\nname = \"note\"\naction = \"write_file\"\npath = \"NOTE\"\ncontent = \"{{ app_name }}\"\n",
        )
        .unwrap();
        let dir = temp.path().to_string_lossy().into_owned();
        let recipe_arg = recipe_path.to_string_lossy().into_owned();

        let args = recipe_args(&[&dir, "--app-name", "blog", "--recipe", &recipe_arg]);
        let recipe = resolve_recipe(&args, &AppConfig::default(), Probing::Forbidden).unwrap();

        assert_eq!(recipe.name, "extras");
        assert_eq!(
            recipe.steps[0],
            Step::write_file("note", "NOTE", "blog")
        );
    }

    #[test]
    fn unknown_version_without_probing_is_input_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_string_lossy().into_owned();

        let args = recipe_args(&[&dir, "--app-name", "blog"]);
        let err = resolve_recipe(&args, &AppConfig::default(), Probing::Forbidden).unwrap_err();

        assert!(matches!(err, CliError::InvalidInput { .. }));
        assert!(err.to_string().contains("--framework-version"));
    }

    #[test]
    fn custom_recipe_carries_description() {
        let temp = TempDir::new().unwrap();
        let recipe_path = temp.path().join("extras.toml");
        std::fs::write(
            &recipe_path,
            "[recipe]\ndescription = \"API tweaks\"\n\n[[steps]]\nname = \"note\"\naction = \"write_file\"\npath = \"NOTE\"\ncontent = \"x\"\n",
        )
        .unwrap();
        let dir = temp.path().to_string_lossy().into_owned();
        let recipe_arg = recipe_path.to_string_lossy().into_owned();

        let args = recipe_args(&[&dir, "--recipe", &recipe_arg]);
        let recipe = resolve_recipe(&args, &AppConfig::default(), Probing::Forbidden).unwrap();

        assert_eq!(recipe.description.as_deref(), Some("API tweaks"));
    }
}
