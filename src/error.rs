//! Application error types and process exit mapping.
//!
//! Defines `AppError` for every failure the tool can hit. Only configuration
//! and repository-open errors are fatal; commit-read errors met during a
//! traversal are recovered by the resolver and surface in the `errors` report.
//!
//! Exit mappings:
//! - `Config` → 1
//! - `RepoNotFound` → 2
//! - everything else → 1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Commit {0} is its own ancestor")]
    Cycle(String),

    #[error("No timestamp exists after the one of commit {0}")]
    TimestampOverflow(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::RepoNotFound(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
