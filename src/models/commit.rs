use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Everything the resolver and the long report need to know about one commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitMetadata {
    pub id: String,
    pub author: Identity,
    pub committer: Identity,
    #[serde(with = "crate::models::rfc3339")]
    pub author_time: DateTime<Utc>,
    #[serde(with = "crate::models::rfc3339")]
    pub committer_time: DateTime<Utc>,
    /// Parent ids in the order git records them. The order is the tie-break.
    pub parents: Vec<String>,
}

impl CommitMetadata {
    pub fn time(&self, source: TimeSource) -> DateTime<Utc> {
        match source {
            TimeSource::Author => self.author_time,
            TimeSource::Committer => self.committer_time,
        }
    }
}

/// Which of the two commit timestamps a run checks. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSource {
    #[default]
    Author,
    Committer,
}

impl FromStr for TimeSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "author" => Ok(TimeSource::Author),
            "committer" => Ok(TimeSource::Committer),
            other => Err(AppError::Config(format!(
                "--type must be either \"author\" or \"committer\", got \"{}\"",
                other
            ))),
        }
    }
}
