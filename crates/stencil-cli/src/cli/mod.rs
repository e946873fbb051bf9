//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stencil_core::domain::Feature;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "stencil",
    bin_name = "stencil",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Apply a repeatable setup recipe to a freshly generated application",
    long_about = "Stencil applies an ordered recipe of file writes, config insertions, \
                  dependency declarations and tool invocations to a freshly \
                  generated Rails application.",
    after_help = "EXAMPLES:\n\
        \x20 stencil plan  ./blog\n\
        \x20 stencil apply ./blog --skip-mail --skip-git\n\
        \x20 stencil apply ./blog --recipe extras.toml --dry-run\n\
        \x20 stencil completions bash > /usr/share/bash-completion/completions/stencil",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the recipe against an application directory.
    #[command(
        visible_alias = "a",
        about = "Apply the recipe to an application",
        after_help = "EXAMPLES:\n\
            \x20 stencil apply ./blog\n\
            \x20 stencil apply ./blog --framework-version 7.1 --skip-uuid\n\
            \x20 stencil apply ./blog --continue-on-error --timeout 300"
    )]
    Apply(ApplyArgs),

    /// Show the steps a recipe would run.
    #[command(
        visible_alias = "p",
        about = "Print the ordered steps without running them",
        after_help = "EXAMPLES:\n\
            \x20 stencil plan ./blog\n\
            \x20 stencil plan ./blog --skip-css --output-format json"
    )]
    Plan(PlanArgs),

    /// Initialise a Stencil configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 stencil init          # default location\n\
            \x20 stencil init --force  # overwrite an existing file\n\
            \x20 stencil -c ./stencil.toml init"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 stencil completions bash > ~/.local/share/bash-completion/completions/stencil\n\
            \x20 stencil completions zsh  > ~/.zfunc/_stencil\n\
            \x20 stencil completions fish > ~/.config/fish/completions/stencil.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the Stencil configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 stencil config get executor.fail_fast\n\
            \x20 stencil config list\n\
            \x20 stencil config path"
    )]
    Config(ConfigCommands),
}

// ── recipe selection (shared by apply and plan) ──────────────────────────────

/// Which recipe to run, and with what inputs.
#[derive(Debug, Clone, Args)]
pub struct RecipeArgs {
    /// Application directory the recipe runs in.
    #[arg(value_name = "DIR", default_value = ".", help = "Application directory")]
    pub dir: PathBuf,

    #[arg(long = "skip-uuid", help = "Skip uuid primary keys (pgcrypto)")]
    pub skip_uuid: bool,

    #[arg(long = "skip-jobs", help = "Skip background jobs (sidekiq)")]
    pub skip_jobs: bool,

    #[arg(long = "skip-mail", help = "Skip the development mail catcher")]
    pub skip_mail: bool,

    #[arg(long = "skip-css", help = "Skip Tailwind CSS")]
    pub skip_css: bool,

    #[arg(long = "skip-procfile", help = "Skip Procfile.dev")]
    pub skip_procfile: bool,

    #[arg(long = "skip-ignore", help = "Skip the .ignore file")]
    pub skip_ignore: bool,

    #[arg(long = "skip-git", help = "Skip the final git commit")]
    pub skip_git: bool,

    /// Defaults to the directory name.
    #[arg(long = "app-name", value_name = "NAME", help = "Application name")]
    pub app_name: Option<String>,

    /// Defaults to the output of `bin/rails -v` in DIR.
    #[arg(
        long = "framework-version",
        value_name = "VERSION",
        help = "Framework version, e.g. 7.1"
    )]
    pub framework_version: Option<String>,

    /// Replace the built-in recipe with a TOML recipe file. The `--skip-*`
    /// flags only select built-in features and cannot be combined with it.
    #[arg(
        long = "recipe",
        value_name = "FILE",
        help = "Custom recipe file (TOML)",
        conflicts_with_all = [
            "skip_uuid",
            "skip_jobs",
            "skip_mail",
            "skip_css",
            "skip_procfile",
            "skip_ignore",
            "skip_git",
        ]
    )]
    pub recipe: Option<PathBuf>,
}

impl RecipeArgs {
    /// Features turned off by `--skip-*` flags.
    pub fn skipped(&self) -> Vec<Feature> {
        [
            (self.skip_uuid, Feature::Uuid),
            (self.skip_jobs, Feature::Jobs),
            (self.skip_mail, Feature::Mail),
            (self.skip_css, Feature::Css),
            (self.skip_procfile, Feature::Procfile),
            (self.skip_ignore, Feature::Ignore),
            (self.skip_git, Feature::Git),
        ]
        .into_iter()
        .filter_map(|(skip, feature)| skip.then_some(feature))
        .collect()
    }
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `stencil apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Keep going after a failed step.
    #[arg(
        long = "continue-on-error",
        help = "Run remaining steps after a failure"
    )]
    pub continue_on_error: bool,

    /// Kill external commands after this many seconds.
    #[arg(
        long = "timeout",
        value_name = "SECS",
        help = "Per-command timeout in seconds"
    )]
    pub timeout: Option<u64>,

    /// Record every step without touching files or running tools.
    #[arg(long = "dry-run", help = "Show what would run without running it")]
    pub dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", help = "Skip confirmation and apply immediately")]
    pub yes: bool,
}

// ── plan ──────────────────────────────────────────────────────────────────────

/// Arguments for `stencil plan`.
#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `stencil init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `stencil completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `stencil config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `executor.fail_fast`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
