//! Exit codes and error messages of the `stencil` binary.

use std::fs;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn stencil(sandbox: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("stencil");
    cmd.current_dir(sandbox.path())
        .env("HOME", sandbox.path())
        .env("XDG_CONFIG_HOME", sandbox.path().join("xdg"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn app_dir(sandbox: &TempDir) -> std::path::PathBuf {
    let app = sandbox.path().join("blog");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("Gemfile"), "source \"https://rubygems.org\"\n").unwrap();
    app
}

#[test]
fn unknown_flag_is_usage_error() {
    let sandbox = TempDir::new().unwrap();
    stencil(&sandbox)
        .args(["apply", "--frobnicate"])
        .assert()
        .code(2);
}

#[test]
fn missing_directory_exits_3() {
    let sandbox = TempDir::new().unwrap();
    stencil(&sandbox)
        .args(["plan", "no-such-app", "--framework-version", "7.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn broken_config_file_exits_4() {
    let sandbox = TempDir::new().unwrap();
    let config = sandbox.path().join("broken.toml");
    fs::write(&config, "[executor\n").unwrap();

    stencil(&sandbox)
        .arg("-c")
        .arg(&config)
        .args(["config", "list"])
        .assert()
        .code(4);
}

#[test]
fn unknown_feature_in_config_exits_4() {
    let sandbox = TempDir::new().unwrap();
    let app = app_dir(&sandbox);

    stencil(&sandbox)
        .env("STENCIL__RECIPE__SKIP", "webpack")
        .arg("plan")
        .arg(&app)
        .args(["--framework-version", "7.1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("webpack"));
}

#[test]
fn invalid_recipe_is_user_error() {
    let sandbox = TempDir::new().unwrap();
    let app = app_dir(&sandbox);
    let recipe = sandbox.path().join("bad.toml");
    fs::write(
        &recipe,
        "[[steps]]\nname = \"abs\"\naction = \"write_file\"\npath = \"/etc/motd\"\ncontent = \"\"\n",
    )
    .unwrap();

    stencil(&sandbox)
        .arg("plan")
        .arg(&app)
        .arg("--recipe")
        .arg(&recipe)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Absolute paths not allowed"));
}

#[test]
fn recipe_cannot_write_outside_the_app() {
    let sandbox = TempDir::new().unwrap();
    let app = app_dir(&sandbox);
    let recipe = sandbox.path().join("escape.toml");
    fs::write(
        &recipe,
        "[[steps]]\nname = \"escape\"\naction = \"write_file\"\npath = \"../outside.txt\"\ncontent = \"x\"\n",
    )
    .unwrap();

    stencil(&sandbox)
        .arg("apply")
        .arg(&app)
        .arg("--recipe")
        .arg(&recipe)
        .arg("--yes")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("leaves the application directory"));

    assert!(!sandbox.path().join("outside.txt").exists());
}

#[cfg(unix)]
#[test]
fn failed_step_exits_5_and_names_the_step() {
    let sandbox = TempDir::new().unwrap();
    let app = app_dir(&sandbox);
    let recipe = sandbox.path().join("fails.toml");
    fs::write(
        &recipe,
        r#"
[[steps]]
name = "always fails"
action = "run_command"
program = "false"

[[steps]]
name = "never runs"
action = "write_file"
path = "after.txt"
content = "x"
"#,
    )
    .unwrap();

    stencil(&sandbox)
        .arg("apply")
        .arg(&app)
        .arg("--recipe")
        .arg(&recipe)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("always fails"))
        .stderr(predicate::str::contains("command failed"));

    assert!(!app.join("after.txt").exists());
}

#[cfg(unix)]
#[test]
fn continue_on_error_runs_later_steps_but_still_fails() {
    let sandbox = TempDir::new().unwrap();
    let app = app_dir(&sandbox);
    let recipe = sandbox.path().join("fails.toml");
    fs::write(
        &recipe,
        r#"
[[steps]]
name = "always fails"
action = "run_command"
program = "false"

[[steps]]
name = "still runs"
action = "write_file"
path = "after.txt"
content = "x"
"#,
    )
    .unwrap();

    stencil(&sandbox)
        .arg("apply")
        .arg(&app)
        .arg("--recipe")
        .arg(&recipe)
        .arg("--continue-on-error")
        .assert()
        .code(5);

    assert_eq!(fs::read_to_string(app.join("after.txt")).unwrap(), "x");
}

#[test]
fn missing_anchor_exits_5_and_leaves_file() {
    let sandbox = TempDir::new().unwrap();
    let app = app_dir(&sandbox);
    fs::write(app.join("routes.rb"), "# empty\n").unwrap();
    let recipe = sandbox.path().join("insert.toml");
    fs::write(
        &recipe,
        r#"
[[steps]]
name = "mount health check"
action = "insert_text"
target_path = "routes.rb"
anchor = { literal = "Rails.application.routes.draw do\n" }
position = "after"
snippet = "  get \"/up\"\n"
"#,
    )
    .unwrap();

    stencil(&sandbox)
        .arg("apply")
        .arg(&app)
        .arg("--recipe")
        .arg(&recipe)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("mount health check"))
        .stderr(predicate::str::contains("anchor not found"));

    assert_eq!(fs::read_to_string(app.join("routes.rb")).unwrap(), "# empty\n");
}
