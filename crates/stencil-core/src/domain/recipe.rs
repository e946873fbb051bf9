//! The built-in web application recipe.
//!
//! Turns [`RecipeOptions`] into the ordered list of steps applied on top of a
//! freshly generated Rails application: uuid primary keys, background jobs,
//! local mail catching, Tailwind CSS, a process-supervisor file, an ignore
//! file, and a version-control commit.
//!
//! Dependency steps come first and are followed by a single install step,
//! because later generator commands load the bundle.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::DomainError,
    render::{params, render},
    step::{Dependency, Step},
};

/// Manifest that dependency steps append to.
pub const DEPENDENCY_MANIFEST: &str = "Gemfile";

const MIGRATION_TEMPLATE: &str = "\
class EnablePgcrypto < ActiveRecord::Migration[{{framework_version}}]
  def change
    enable_extension 'pgcrypto'
  end
end
";

const GENERATORS_INITIALIZER: &str = "\
Rails.application.config.generators do |g|
  g.orm :active_record, primary_key_type: :uuid
end
";

const JOBS_CONFIG_TEMPLATE: &str = "\
:concurrency: {{concurrency}}
:queues:
  - {{app}}_development_default
  - {{app}}_development_mailers
  - {{app}}_production_default
  - {{app}}_production_mailers
";

const JOBS_ENV_TEMPLATE: &str = "\
config.active_job.queue_adapter = :sidekiq
config.active_job.queue_name_prefix = \"{{app}}_#{Rails.env}\"";

const MAIL_ENV_SNIPPET: &str = "\
config.action_mailer.delivery_method = :smtp
config.action_mailer.smtp_settings = { address: \"localhost\", port: 1025 }";

const CSS_ENTRY: &str = "\
@import \"tailwindcss/base\";
@import \"tailwindcss/components\";
@import \"tailwindcss/utilities\";
";

const IGNORE_FILE: &str = "app/assets/builds\n";

const JOB_CONCURRENCY: u32 = 5;

/// An optional block of the recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// pgcrypto migration + uuid primary keys for generators.
    Uuid,
    /// Sidekiq wiring for Active Job.
    Jobs,
    /// SMTP delivery to a local mail catcher in development.
    Mail,
    /// Tailwind CSS entry point.
    Css,
    /// `Procfile.dev` for the process supervisor.
    Procfile,
    /// `.ignore` for search tools.
    Ignore,
    /// Commit the result.
    Git,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Self::Uuid,
        Self::Jobs,
        Self::Mail,
        Self::Css,
        Self::Procfile,
        Self::Ignore,
        Self::Git,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Jobs => "jobs",
            Self::Mail => "mail",
            Self::Css => "css",
            Self::Procfile => "procfile",
            Self::Ignore => "ignore",
            Self::Git => "git",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownFeature(s.to_string()))
    }
}

/// Inputs to [`build_recipe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeOptions {
    app_name: String,
    framework_version: String,
    skipped: BTreeSet<Feature>,
}

impl RecipeOptions {
    /// `app_name` is normalized to snake_case for queue names.
    pub fn new(
        app_name: impl AsRef<str>,
        framework_version: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let raw = app_name.as_ref();
        let app_name = to_snake_case(raw);
        if app_name.is_empty() {
            return Err(DomainError::InvalidAppName {
                name: raw.to_string(),
                reason: "name cannot be empty".into(),
            });
        }
        if !app_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::InvalidAppName {
                name: raw.to_string(),
                reason: "only ASCII letters, digits, '-' and '_' are allowed".into(),
            });
        }

        Ok(Self {
            app_name,
            framework_version: framework_version.into(),
            skipped: BTreeSet::new(),
        })
    }

    pub fn skip(mut self, feature: Feature) -> Self {
        self.skipped.insert(feature);
        self
    }

    pub fn skip_all<I: IntoIterator<Item = Feature>>(mut self, features: I) -> Self {
        self.skipped.extend(features);
        self
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        !self.skipped.contains(&feature)
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn framework_version(&self) -> &str {
        &self.framework_version
    }
}

/// Build the ordered step list for `options`.
pub fn build_recipe(options: &RecipeOptions) -> Result<Vec<Step>, DomainError> {
    let app = options.app_name();
    let mut steps = Vec::new();

    // ── dependencies ─────────────────────────────────────────────────────
    if options.is_enabled(Feature::Jobs) {
        steps.push(Step::add_dependency(
            "add sidekiq",
            Dependency::new("sidekiq"),
        ));
    }
    if options.is_enabled(Feature::Css) {
        steps.push(Step::add_dependency(
            "add tailwindcss-rails",
            Dependency::new("tailwindcss-rails"),
        ));
    }
    if !steps.is_empty() {
        steps.push(Step::install_dependencies(
            "bundle install",
            "bundle",
            ["install"],
        ));
    }

    // ── uuid primary keys ────────────────────────────────────────────────
    if options.is_enabled(Feature::Uuid) {
        steps.push(Step::run_command(
            "generate pgcrypto migration",
            "bin/rails",
            ["generate", "migration", "enable_pgcrypto"],
        ));
        let migration = render(
            MIGRATION_TEMPLATE,
            &params([("framework_version", options.framework_version())]),
        )?;
        steps.push(Step::write_file(
            "write pgcrypto migration",
            "db/migrate/*_enable_pgcrypto.rb",
            migration,
        ));
        steps.push(Step::write_file(
            "configure uuid generators",
            "config/initializers/generators.rb",
            GENERATORS_INITIALIZER,
        ));
    }

    // ── background jobs ──────────────────────────────────────────────────
    if options.is_enabled(Feature::Jobs) {
        let concurrency = JOB_CONCURRENCY.to_string();
        steps.push(Step::write_file(
            "write sidekiq config",
            "config/sidekiq.yml",
            render(
                JOBS_CONFIG_TEMPLATE,
                &params([("app", app), ("concurrency", &concurrency)]),
            )?,
        ));
        steps.push(Step::append_env(
            "configure active job",
            None,
            render(JOBS_ENV_TEMPLATE, &params([("app", app)]))?,
        ));
    }

    // ── mail catcher ─────────────────────────────────────────────────────
    if options.is_enabled(Feature::Mail) {
        steps.push(Step::append_env(
            "configure mail catcher",
            Some("development"),
            MAIL_ENV_SNIPPET,
        ));
    }

    // ── css ──────────────────────────────────────────────────────────────
    if options.is_enabled(Feature::Css) {
        steps.push(Step::write_file(
            "write tailwind entry",
            "app/assets/stylesheets/application.tailwind.css",
            CSS_ENTRY,
        ));
    }

    // ── process supervisor ───────────────────────────────────────────────
    if options.is_enabled(Feature::Procfile) {
        steps.push(Step::write_file(
            "write Procfile.dev",
            "Procfile.dev",
            procfile(options),
        ));
    }

    if options.is_enabled(Feature::Ignore) {
        steps.push(Step::write_file("write .ignore", ".ignore", IGNORE_FILE));
    }

    // ── version control ──────────────────────────────────────────────────
    if options.is_enabled(Feature::Git) {
        steps.push(Step::run_command("git add", "git", ["add", "-A"]));
        steps.push(Step::run_command(
            "git commit",
            "git",
            ["commit", "-m", "Apply stencil recipe"],
        ));
    }

    Ok(steps)
}

/// `name: command` lines for every long-running process the recipe enables.
fn procfile(options: &RecipeOptions) -> String {
    let mut lines = vec![("web", "bin/rails server -p 3000")];
    if options.is_enabled(Feature::Jobs) {
        lines.push(("worker", "bundle exec sidekiq -C config/sidekiq.yml"));
    }
    if options.is_enabled(Feature::Css) {
        lines.push(("css", "bin/rails tailwindcss:watch"));
    }
    if options.is_enabled(Feature::Mail) {
        lines.push(("mail", "mailcatcher --foreground"));
    }

    lines
        .into_iter()
        .map(|(name, cmd)| format!("{name}: {cmd}\n"))
        .collect()
}

/// Extract `major.minor` from framework version output such as
/// `"Rails 7.1.3.2\n"`.
pub fn parse_framework_version(output: &str) -> Result<String, DomainError> {
    let unrecognized = || DomainError::UnrecognizedVersion {
        output: output.trim().to_string(),
    };

    let token = output.split_whitespace().last().ok_or_else(unrecognized)?;
    let mut parts = token.split('.');
    let major = parts.next().filter(|p| is_number(p)).ok_or_else(unrecognized)?;
    let minor = parts.next().filter(|p| is_number(p)).ok_or_else(unrecognized)?;

    Ok(format!("{major}.{minor}"))
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Convert a string to snake_case.
///
/// | Input | Output |
/// |-------|--------|
/// | "MyApp" | "my_app" |
/// | "my-app" | "my_app" |
/// | "HTTPServer" | "http_server" |
fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// Split on `_`, `-`, whitespace, camelCase transitions and acronym ends.
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(next) = chars.peek() {
            // "myApp" → "my" + "App"
            if c.is_lowercase() && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            // "HTTPServer" → "HTTP" + "Server"
            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}
