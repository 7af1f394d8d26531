// taskdesk/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Why a persisted line could not be turned into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("bad date {0:?}")]
    Date(String),
    #[error("bad {field}: {reason}")]
    Field { field: &'static str, reason: String },
    #[error("missing ';' separator")]
    MissingSeparator,
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{field} cannot contain {found:?}")]
    InvalidChars { field: &'static str, found: &'static str },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("invalid date {input:?}, expected DD MMM YYYY (e.g. 18 Jun 2019)")]
    InvalidDate { input: String },
    #[error("user {username:?} does not exist")]
    UserNotFound { username: String },
    #[error("username {username:?} already exists")]
    AlreadyExists { username: String },
    #[error("wrong password")]
    WrongPassword,
    #[error("no task numbered {index} (there are {len})")]
    NotFound { index: usize, len: usize },
    #[error("{}:{line}: {source}", path.display())]
    Decode { path: PathBuf, line: usize, #[source] source: DecodeError },
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

impl TaskError {
    /// Storage faults end the program; everything else is reported and the caller moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Decode { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
