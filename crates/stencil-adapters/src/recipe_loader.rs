//! TOML recipe loader.
//!
//! Reads a custom recipe file and turns it into domain [`Step`]s, ready for
//! the executor. Text fields may reference parameters with `{{ name }}`.
//!
//! # Format
//!
//! ```toml
//! [recipe]
//! name        = "api-extras"          # optional, defaults to the file stem
//! description = "Extra API setup"     # optional
//!
//! [params]                            # optional defaults
//! port = "4000"
//!
//! [[steps]]
//! name    = "write Procfile.dev"
//! action  = "write_file"              # write_file | insert_text | append_env
//!                                     # add_dependency | run_command
//! path    = "Procfile.dev"
//! content = "web: bin/rails server -p {{ port }}\n"
//!
//! [[steps]]
//! name        = "enable cors"
//! action      = "append_env"
//! environment = "development"         # omit for config/application.rb
//! snippet     = "config.hosts << \"{{ app_name }}.test\""
//!
//! [[steps]]
//! name        = "mount health check"
//! action      = "insert_text"
//! target_path = "config/routes.rb"
//! anchor      = { literal = "Rails.application.routes.draw do\n" }
//! position    = "after"               # before | after
//! snippet     = "  get \"/up\" => \"rails/health#show\"\n"
//!
//! [[steps]]
//! name    = "add rack-cors"
//! action  = "add_dependency"
//! package = "rack-cors"
//! version = "~> 2.0"                  # optional, as is `group`
//! ```

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, instrument};

use stencil_core::{
    application::ApplicationError,
    domain::{DomainError, DomainValidator, Step, StepAction, render},
    error::StencilResult,
};

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a recipe file.
#[derive(Debug, Deserialize)]
struct RecipeManifest {
    #[serde(default)]
    recipe: RecipeSection,
    #[serde(default)]
    params: HashMap<String, String>,
    #[serde(default)]
    steps: Vec<Step>,
}

/// `[recipe]` section.
#[derive(Debug, Default, Deserialize)]
struct RecipeSection {
    name: Option<String>,
    description: Option<String>,
}

/// A recipe read from disk, parameters already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRecipe {
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<Step>,
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Loads a [`LoadedRecipe`] from a TOML file.
///
/// Parameters set with [`param`](Self::param) override the file's `[params]`
/// table.
#[derive(Debug, Clone)]
pub struct RecipeLoader {
    path: PathBuf,
    params: HashMap<String, String>,
}

impl RecipeLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    /// Read, parse, render and validate the recipe.
    ///
    /// # Errors
    ///
    /// - [`ApplicationError::FileNotFound`] if the file is missing.
    /// - [`ApplicationError::RecipeLoad`] if it cannot be read or parsed, or a
    ///   text field names an unknown parameter.
    /// - [`DomainError`] if a step is invalid or the recipe is empty.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> StencilResult<LoadedRecipe> {
        if !self.path.exists() {
            return Err(ApplicationError::FileNotFound {
                path: self.path.clone(),
            }
            .into());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| self.load_error(e))?;
        let manifest: RecipeManifest = toml::from_str(&raw).map_err(|e| self.load_error(e))?;

        if manifest.steps.is_empty() {
            return Err(DomainError::EmptyRecipe.into());
        }

        let mut params = manifest.params;
        params.extend(self.params.clone());

        let steps = manifest
            .steps
            .iter()
            .map(|step| render_step(step, &params))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.load_error(e))?;

        DomainValidator::validate_steps(&steps)?;

        let name = manifest.recipe.name.unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "recipe".into())
        });
        debug!(%name, steps = steps.len(), "Loaded recipe");

        Ok(LoadedRecipe {
            name,
            description: manifest.recipe.description,
            steps,
        })
    }

    fn load_error(&self, e: impl ToString) -> ApplicationError {
        ApplicationError::RecipeLoad {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

/// Substitute parameters into every free-text field of a step.
fn render_step(step: &Step, params: &HashMap<String, String>) -> Result<Step, DomainError> {
    let text = |s: &str| render(s, params);
    let path = |p: &Path| text(&p.to_string_lossy()).map(PathBuf::from);

    let action = match step.action().clone() {
        StepAction::WriteFile {
            path: target,
            content,
            policy,
        } => StepAction::WriteFile {
            path: path(&target)?,
            content: text(&content)?,
            policy,
        },
        StepAction::InsertText(mut spec) => {
            spec.target_path = path(&spec.target_path)?;
            spec.snippet = text(&spec.snippet)?;
            StepAction::InsertText(spec)
        }
        StepAction::AppendEnv {
            environment,
            snippet,
        } => StepAction::AppendEnv {
            environment,
            snippet: text(&snippet)?,
        },
        dep @ StepAction::AddDependency(_) => dep,
        StepAction::RunCommand {
            program,
            args,
            purpose,
        } => StepAction::RunCommand {
            program,
            args: args.iter().map(|a| text(a)).collect::<Result<_, _>>()?,
            purpose,
        },
    };

    Ok(Step::new(step.name(), action))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_core::{
        domain::{Anchor, CommandPurpose, Dependency, Position, WritePolicy},
        error::StencilError,
    };
    use tempfile::TempDir;

    fn write_recipe(body: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("extras.toml");
        fs::write(&path, body).unwrap();
        (temp, path)
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = RecipeLoader::new("/does/not/exist.toml").load().unwrap_err();
        assert!(matches!(
            err,
            StencilError::Application(ApplicationError::FileNotFound { .. })
        ));
    }

    #[test]
    fn loads_every_action() {
        let (_temp, path) = write_recipe(
            r##"
[[steps]]
name = "procfile"
action = "write_file"
path = "Procfile.dev"
content = "web: x\n"
policy = "create-only"

[[steps]]
name = "route"
action = "insert_text"
target_path = "config/routes.rb"
anchor = { pattern = "routes\\.draw do\\n" }
position = "before"
snippet = "# routes\n"

[[steps]]
name = "env"
action = "append_env"
snippet = "config.x = 1"

[[steps]]
name = "gem"
action = "add_dependency"
package = "sidekiq"
version = "~> 7.2"

[[steps]]
name = "install"
action = "run_command"
program = "bundle"
args = ["install"]
purpose = "install-dependencies"
"##,
        );
        let recipe = RecipeLoader::new(&path).load().unwrap();

        assert_eq!(recipe.name, "extras");
        assert_eq!(recipe.steps.len(), 5);
        assert_eq!(
            recipe.steps[0].action(),
            &StepAction::WriteFile {
                path: "Procfile.dev".into(),
                content: "web: x\n".into(),
                policy: WritePolicy::CreateOnly,
            }
        );
        match recipe.steps[1].action() {
            StepAction::InsertText(spec) => {
                assert_eq!(spec.anchor, Anchor::pattern("routes\\.draw do\\n"));
                assert_eq!(spec.position, Position::Before);
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(
            recipe.steps[2].action(),
            &StepAction::AppendEnv {
                environment: None,
                snippet: "config.x = 1".into(),
            }
        );
        assert_eq!(
            recipe.steps[3].action(),
            &StepAction::AddDependency(Dependency::new("sidekiq").version("~> 7.2"))
        );
        assert!(matches!(
            recipe.steps[4].action(),
            StepAction::RunCommand {
                purpose: CommandPurpose::InstallDependencies,
                ..
            }
        ));
    }

    #[test]
    fn params_render_into_text_fields() {
        let (_temp, path) = write_recipe(
            r#"
[recipe]
name = "custom"

[params]
port = "4000"

[[steps]]
name = "procfile"
action = "write_file"
path = "{{ app_name }}.procfile"
content = "web: bin/rails server -p {{ port }}\n"

[[steps]]
name = "echo"
action = "run_command"
program = "echo"
args = ["{{ app_name }}"]
"#,
        );
        let recipe = RecipeLoader::new(&path)
            .param("app_name", "blog")
            .param("port", "5000")
            .load()
            .unwrap();

        assert_eq!(recipe.name, "custom");
        assert_eq!(
            recipe.steps[0].action(),
            &StepAction::WriteFile {
                path: "blog.procfile".into(),
                content: "web: bin/rails server -p 5000\n".into(),
                policy: WritePolicy::Overwrite,
            }
        );
        match recipe.steps[1].action() {
            StepAction::RunCommand { args, .. } => assert_eq!(args, &vec!["blog".to_string()]),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn unknown_param_is_a_load_error() {
        let (_temp, path) = write_recipe(
            r#"
[[steps]]
name = "w"
action = "write_file"
path = "a.txt"
content = "{{ nope }}"
"#,
        );
        let err = RecipeLoader::new(&path).load().unwrap_err();
        assert!(matches!(
            err,
            StencilError::Application(ApplicationError::RecipeLoad { .. })
        ));
    }

    #[test]
    fn empty_recipe_is_rejected() {
        let (_temp, path) = write_recipe("[recipe]\nname = \"empty\"\n");
        let err = RecipeLoader::new(&path).load().unwrap_err();
        assert!(matches!(err, StencilError::Domain(DomainError::EmptyRecipe)));
    }

    #[test]
    fn invalid_steps_are_rejected() {
        let (_temp, path) = write_recipe(
            r#"
[[steps]]
name = "abs"
action = "write_file"
path = "/etc/passwd"
content = ""
"#,
        );
        assert!(matches!(
            RecipeLoader::new(&path).load(),
            Err(StencilError::Domain(DomainError::AbsolutePathNotAllowed { .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_load_error() {
        let (_temp, path) = write_recipe("[[steps]\nname = ");
        assert!(matches!(
            RecipeLoader::new(&path).load(),
            Err(StencilError::Application(ApplicationError::RecipeLoad { .. }))
        ));
    }
}
