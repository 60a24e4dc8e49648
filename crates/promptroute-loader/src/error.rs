use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to turn one profile document into a profile
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("missing YAML front matter (expected a leading '---' fence)")]
    MissingFrontMatter,

    #[error("unterminated YAML front matter (missing closing '---' fence)")]
    UnterminatedFrontMatter,

    #[error("invalid YAML front matter: {0}")]
    Yaml(String),

    #[error("missing required '{0}' section")]
    MissingSection(String),

    #[error("'{0}' section is empty")]
    EmptySection(String),

    #[error("profile name is empty")]
    EmptyName,

    #[error("invalid complexity_tier '{0}' (expected 'base' or 'complex')")]
    InvalidTier(String),

    #[error("duplicate profile name '{name}' (already defined in {first_file})")]
    DuplicateName { name: String, first_file: String },

    #[error("read timed out after {0} ms")]
    ReadTimeout(u64),

    #[error("read failed: {0}")]
    Read(String),
}

/// Failure to resolve a profile's `extends` chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtendsError {
    #[error("profile '{profile}' extends itself")]
    SelfReference { profile: String },

    #[error("profile '{profile}' extends unknown profile '{parent}'")]
    MissingParent { profile: String, parent: String },

    #[error("extends cycle detected: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    #[error("profile '{profile}' inherits from unresolvable profile '{ancestor}'")]
    BrokenAncestor { profile: String, ancestor: String },
}

/// Directory-level reload failure; the previous snapshot stays live
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReloadError {
    #[error("profile directory {path} is unreadable: {message}")]
    DirectoryUnreadable { path: String, message: String },

    #[error("no profiles loaded from {0}")]
    NoProfilesLoaded(String),

    #[error("a reload is already in progress")]
    ReloadInProgress,

    #[error("reload task failed: {0}")]
    Internal(String),
}

/// One reported problem of a reload pass, keyed by file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadIssue {
    pub file: String,
    pub message: String,
}

impl LoadIssue {
    pub fn new(file: impl Into<String>, message: impl ToString) -> Self {
        Self {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReloadError>;
