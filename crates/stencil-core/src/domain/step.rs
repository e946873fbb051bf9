//! Steps: one atomic scaffolding action each.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::insertion::InsertionSpec;

/// What `WriteFile` does when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Replace existing content.
    #[default]
    Overwrite,
    /// Fail with a file conflict if the file exists.
    CreateOnly,
}

/// Why a command is run; decides how a non-zero exit is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandPurpose {
    #[default]
    General,
    /// Package installation; failure means a dependency could not be fetched.
    InstallDependencies,
}

/// A dependency declaration appended to the manifest.
///
/// Serialized as `package` so it does not collide with the step name when
/// flattened into a [`Step`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "package")]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            group: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The manifest line, e.g. `gem "sidekiq", "~> 7.2", group: :development`.
    pub fn manifest_line(&self) -> String {
        let mut line = format!("gem \"{}\"", self.name);
        if let Some(version) = &self.version {
            line.push_str(&format!(", \"{version}\""));
        }
        if let Some(group) = &self.group {
            line.push_str(&format!(", group: :{group}"));
        }
        line
    }
}

/// The action a step performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    WriteFile {
        path: PathBuf,
        content: String,
        #[serde(default)]
        policy: WritePolicy,
    },
    InsertText(InsertionSpec),
    AppendEnv {
        /// `None` targets the application-wide config.
        #[serde(default)]
        environment: Option<String>,
        snippet: String,
    },
    AddDependency(Dependency),
    RunCommand {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        purpose: CommandPurpose,
    },
}

/// Discriminant of [`StepAction`], for logs and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    WriteFile,
    InsertText,
    AppendEnv,
    AddDependency,
    RunCommand,
}

impl ActionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WriteFile => "write_file",
            Self::InsertText => "insert_text",
            Self::AppendEnv => "append_env",
            Self::AddDependency => "add_dependency",
            Self::RunCommand => "run_command",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, immutable scaffolding step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    name: String,
    #[serde(flatten)]
    action: StepAction,
}

impl Step {
    pub fn new(name: impl Into<String>, action: StepAction) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    pub fn write_file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            StepAction::WriteFile {
                path: path.into(),
                content: content.into(),
                policy: WritePolicy::Overwrite,
            },
        )
    }

    pub fn create_file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            StepAction::WriteFile {
                path: path.into(),
                content: content.into(),
                policy: WritePolicy::CreateOnly,
            },
        )
    }

    pub fn insert_text(name: impl Into<String>, spec: InsertionSpec) -> Self {
        Self::new(name, StepAction::InsertText(spec))
    }

    pub fn append_env(
        name: impl Into<String>,
        environment: Option<&str>,
        snippet: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            StepAction::AppendEnv {
                environment: environment.map(str::to_string),
                snippet: snippet.into(),
            },
        )
    }

    pub fn add_dependency(name: impl Into<String>, dependency: Dependency) -> Self {
        Self::new(name, StepAction::AddDependency(dependency))
    }

    pub fn run_command<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            StepAction::RunCommand {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
                purpose: CommandPurpose::General,
            },
        )
    }

    pub fn install_dependencies<I, S>(
        name: impl Into<String>,
        program: impl Into<String>,
        args: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            StepAction::RunCommand {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
                purpose: CommandPurpose::InstallDependencies,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &StepAction {
        &self.action
    }

    pub fn kind(&self) -> ActionKind {
        match self.action {
            StepAction::WriteFile { .. } => ActionKind::WriteFile,
            StepAction::InsertText(_) => ActionKind::InsertText,
            StepAction::AppendEnv { .. } => ActionKind::AppendEnv,
            StepAction::AddDependency(_) => ActionKind::AddDependency,
            StepAction::RunCommand { .. } => ActionKind::RunCommand,
        }
    }

    /// Flat `key → value` view of the action's parameters.
    pub fn parameters(&self) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        match &self.action {
            StepAction::WriteFile {
                path,
                content,
                policy,
            } => {
                params.insert("path", path.display().to_string());
                params.insert("bytes", content.len().to_string());
                if *policy == WritePolicy::CreateOnly {
                    params.insert("policy", "create-only".into());
                }
            }
            StepAction::InsertText(spec) => {
                params.insert("path", spec.target_path.display().to_string());
                params.insert("anchor", spec.anchor.to_string());
                params.insert("position", spec.position.to_string());
            }
            StepAction::AppendEnv { environment, .. } => {
                params.insert(
                    "environment",
                    environment.clone().unwrap_or_else(|| "all".into()),
                );
            }
            StepAction::AddDependency(dep) => {
                params.insert("package", dep.name.clone());
                if let Some(version) = &dep.version {
                    params.insert("version", version.clone());
                }
                if let Some(group) = &dep.group {
                    params.insert("group", group.clone());
                }
            }
            StepAction::RunCommand { program, args, .. } => {
                params.insert("command", command_line(program, args));
            }
        }
        params
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind())
    }
}

/// Render a program and its arguments as a single shell-like line.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|part| {
            if part.contains(char::is_whitespace) {
                format!("{part:?}")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
