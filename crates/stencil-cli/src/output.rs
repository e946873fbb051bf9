//! Output management and formatting.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use stencil_core::domain::{ExecutionLog, LogEntry, Outcome, Step};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

/// JSON shape of `stencil plan`.
#[derive(Serialize)]
struct PlanView<'a> {
    recipe: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    steps: &'a [Step],
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = requested_format(args, config);

        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Error indicator: `✗ <msg>`.  *Not* suppressed in quiet mode: errors
    /// must always be visible.
    pub fn error(&self, msg: &str) -> io::Result<()> {
        let line = if self.no_color {
            format!("\u{2717} {msg}") // ✗
        } else {
            format!("{} {}", "\u{2717}".red().bold(), msg.red())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Pretty JSON on stdout. Machine output ignores `--quiet`.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    // ── Recipe rendering ──────────────────────────────────────────────────

    /// The ordered steps of a recipe with their parameters.
    pub fn render_plan(
        &self,
        recipe: &str,
        description: Option<&str>,
        steps: &[Step],
    ) -> io::Result<()> {
        if self.format() == OutputFormat::Json {
            return self.json(&PlanView {
                recipe,
                description,
                steps,
            });
        }

        self.header(&format!("Recipe '{recipe}' ({} steps)", steps.len()))?;
        if let Some(description) = description {
            self.print(description)?;
        }
        for line in plan_lines(steps) {
            self.print(&line)?;
        }
        Ok(())
    }

    /// One line per executed step, then a summary.
    pub fn render_log(&self, log: &ExecutionLog) -> io::Result<()> {
        if self.format() == OutputFormat::Json {
            return self.json(log);
        }

        for entry in log.entries() {
            let line = entry_line(entry);
            match &entry.outcome {
                Outcome::Success => self.success(&line)?,
                Outcome::Failure(failure) => {
                    self.error(&line)?;
                    self.error(&format!("    {}", failure.reason))?;
                }
            }
        }

        if log.was_cancelled() {
            self.warning("Run cancelled; remaining steps were skipped")?;
        }

        let summary = summary_line(log);
        if log.is_success() {
            self.info(&summary)
        } else {
            self.warning(&summary)
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// Format asked for by the flag, falling back to `output.format` in config.
/// May still be `Auto`; stdout resolves that against the terminal.
pub fn requested_format(args: &GlobalArgs, config: &AppConfig) -> OutputFormat {
    match args.output_format {
        OutputFormat::Auto => parse_format(&config.output.format),
        explicit => explicit,
    }
}

fn parse_format(value: &str) -> OutputFormat {
    match value.to_ascii_lowercase().as_str() {
        "human" => OutputFormat::Human,
        "plain" => OutputFormat::Plain,
        "json" => OutputFormat::Json,
        _ => OutputFormat::Auto,
    }
}

fn plan_lines(steps: &[Step]) -> Vec<String> {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let params = step
                .parameters()
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!("{:>3}. {:<40} {:<15} {}", i + 1, step.name(), step.kind().as_str(), params)
                .trim_end()
                .to_string()
        })
        .collect()
}

fn entry_line(entry: &LogEntry) -> String {
    let suffix = if entry.dry_run {
        " (dry run)".to_string()
    } else {
        format!(" ({} ms)", entry.duration_ms)
    };
    format!("{} [{}]{}", entry.step, entry.action, suffix)
}

fn summary_line(log: &ExecutionLog) -> String {
    format!(
        "{} step(s) run: {} succeeded, {} failed",
        log.len(),
        log.succeeded(),
        log.failed()
    )
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use stencil_core::domain::{Dependency, FailureKind, StepFailure};

    fn make_manager(quiet: bool, no_color: bool, format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            output_format: format,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.print("hello").is_ok());
        assert!(out.is_quiet());
    }

    #[test]
    fn error_not_suppressed_in_quiet_mode() {
        let out = make_manager(true, true, OutputFormat::Plain);
        assert!(out.error("something went wrong").is_ok());
    }

    #[test]
    fn plain_output_never_colours() {
        let out = make_manager(false, false, OutputFormat::Plain);
        assert!(!out.supports_color());
        let human = make_manager(false, false, OutputFormat::Human);
        assert!(human.supports_color());
    }

    #[test]
    fn config_format_applies_when_flag_is_auto() {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: false,
            config: None,
            output_format: OutputFormat::Auto,
        };
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        assert_eq!(OutputManager::new(&args, &config).format(), OutputFormat::Json);
    }

    #[test]
    fn explicit_flag_beats_config_format() {
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        let mut args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: false,
            config: None,
            output_format: OutputFormat::Auto,
        };
        assert_eq!(requested_format(&args, &config), OutputFormat::Json);

        args.output_format = OutputFormat::Plain;
        assert_eq!(requested_format(&args, &config), OutputFormat::Plain);
    }

    #[test]
    fn plan_lines_show_kind_and_parameters() {
        let steps = vec![
            Step::add_dependency("add sidekiq", Dependency::new("sidekiq")),
            Step::run_command("commit", "git", ["commit", "-m", "Apply stencil recipe"]),
        ];
        let lines = plan_lines(&steps);
        assert!(lines[0].starts_with("  1. add sidekiq"));
        assert!(lines[0].contains("add_dependency"));
        assert!(lines[0].ends_with("package=sidekiq"));
        assert!(lines[1].contains("command=git commit -m \"Apply stencil recipe\""));
    }

    #[test]
    fn entry_line_marks_dry_run() {
        let step = Step::write_file("write .ignore", ".ignore", "");
        let entry = LogEntry::new(&step, Outcome::Success, Duration::from_millis(7), true);
        assert_eq!(entry_line(&entry), "write .ignore [write_file] (dry run)");
    }

    #[test]
    fn summary_counts_failures() {
        let mut log = ExecutionLog::new();
        let ok = Step::write_file("a", "a", "");
        let bad = Step::write_file("b", "b", "");
        log.record(LogEntry::new(&ok, Outcome::Success, Duration::ZERO, false));
        log.record(LogEntry::new(
            &bad,
            Outcome::Failure(StepFailure::new(FailureKind::Io, "disk full")),
            Duration::ZERO,
            false,
        ));
        assert_eq!(summary_line(&log), "2 step(s) run: 1 succeeded, 1 failed");
    }

    #[test]
    fn render_json_plan_succeeds() {
        let out = make_manager(true, true, OutputFormat::Json);
        let steps = vec![Step::write_file("w", "a.txt", "x")];
        assert!(out.render_plan("builtin", None, &steps).is_ok());
    }
}
