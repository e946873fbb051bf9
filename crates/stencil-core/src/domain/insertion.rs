//! Text insertion engine.
//!
//! Given a file's contents and an [`InsertionSpec`], produce new contents with
//! the snippet placed once, directly before or after the first anchor match.
//! The input is never mutated; on failure the caller still holds the original.

use std::ops::Range;
use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Which side of the anchor the snippet goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    #[default]
    After,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Locates the insertion point.
///
/// Patterns are stored as source text and compiled on use so that specs stay
/// `Clone + PartialEq` and serialize as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Literal(String),
    Pattern(String),
}

impl Anchor {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn pattern(source: impl Into<String>) -> Self {
        Self::Pattern(source.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) | Self::Pattern(s) => s,
        }
    }

    /// Compile a pattern anchor; literal anchors always succeed.
    pub fn check(&self) -> Result<(), DomainError> {
        match self {
            Self::Literal(_) => Ok(()),
            Self::Pattern(source) => compile(source).map(|_| ()),
        }
    }

    /// Byte range of the leftmost match, if any.
    fn locate(&self, haystack: &str) -> Result<Option<Range<usize>>, DomainError> {
        match self {
            Self::Literal(needle) => {
                Ok(haystack.find(needle.as_str()).map(|start| start..start + needle.len()))
            }
            Self::Pattern(source) => Ok(compile(source)?.find(haystack).map(|m| m.range())),
        }
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s:?}"),
            Self::Pattern(s) => write!(f, "/{s}/"),
        }
    }
}

fn compile(source: &str) -> Result<Regex, DomainError> {
    Regex::new(source).map_err(|e| DomainError::InvalidPattern {
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

/// Where and what to insert.
///
/// `target_path` is relative to the working directory. Its final component
/// may contain `*` wildcards (see [`crate::domain::paths`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionSpec {
    pub target_path: PathBuf,
    pub anchor: Anchor,
    #[serde(default)]
    pub position: Position,
    pub snippet: String,
}

impl InsertionSpec {
    pub fn new(
        target_path: impl Into<PathBuf>,
        anchor: Anchor,
        position: Position,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            target_path: target_path.into(),
            anchor,
            position,
            snippet: snippet.into(),
        }
    }

    pub fn after(target_path: impl Into<PathBuf>, anchor: &str, snippet: impl Into<String>) -> Self {
        Self::new(target_path, Anchor::literal(anchor), Position::After, snippet)
    }
}

/// Insert `spec.snippet` next to the first match of `spec.anchor`.
///
/// There is no duplicate detection: applying the same spec twice inserts the
/// snippet twice.
pub fn insert(contents: &str, spec: &InsertionSpec) -> Result<String, DomainError> {
    let range = spec
        .anchor
        .locate(contents)?
        .ok_or_else(|| DomainError::AnchorNotFound {
            anchor: spec.anchor.as_str().to_string(),
        })?;

    if spec.snippet.is_empty() {
        return Ok(contents.to_string());
    }

    let offset = match spec.position {
        Position::Before => range.start,
        Position::After => range.end,
    };

    let mut out = String::with_capacity(contents.len() + spec.snippet.len());
    out.push_str(&contents[..offset]);
    out.push_str(&spec.snippet);
    out.push_str(&contents[offset..]);
    Ok(out)
}
