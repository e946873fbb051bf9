//! Wildcard target paths.
//!
//! Framework generators name files with a timestamp prefix
//! (`db/migrate/20240101120000_enable_pgcrypto.rb`), so a step cannot know the
//! exact path up front. A step path may therefore use `*` in its final
//! component; it resolves against the files that exist when the step runs.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::domain::error::DomainError;

/// `true` if the final component contains a wildcard.
pub fn is_wildcard(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains('*'))
}

/// Wildcards are only allowed in the file name, not in directories.
pub fn validate_wildcard(path: &Path) -> Result<(), DomainError> {
    let dir_has_wildcard = path
        .parent()
        .is_some_and(|p| p.to_string_lossy().contains('*'));
    if dir_has_wildcard {
        return Err(DomainError::InvalidStep {
            step: path.display().to_string(),
            reason: "wildcards are only supported in the file name".into(),
        });
    }
    Ok(())
}

/// Pick the match for `pattern` among `candidates` (file names only).
///
/// Candidates are compared by name and the lexicographically greatest match
/// wins, which for timestamp-prefixed files is the newest one.
pub fn pick_match<'a, I>(pattern: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let source = format!(
        "^{}$",
        pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*")
    );
    // Escaped literals joined by `.*` always form a valid regex.
    let re = Regex::new(&source).ok()?;
    candidates
        .into_iter()
        .filter(|name| re.is_match(name))
        .max()
        .map(str::to_string)
}

/// Split a wildcard path into its directory and file-name pattern.
pub fn split(path: &Path) -> (PathBuf, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}
