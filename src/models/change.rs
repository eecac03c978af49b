use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit whose timestamp predates one of its parents, and the time it was
/// moved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub commit_id: String,
    #[serde(with = "crate::models::rfc3339")]
    pub original: DateTime<Utc>,
    #[serde(with = "crate::models::rfc3339")]
    pub corrected: DateTime<Utc>,
    /// `None` only for a root commit dated before the Unix epoch.
    pub causing_parent: Option<String>,
}

/// A commit that could not be read (or could not be ordered) while walking
/// history. The walk carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalError {
    /// The commit that was skipped.
    pub commit_id: String,
    /// The child that was being resolved when the skip happened; `None` when
    /// the commit came straight from the enumeration.
    pub child_id: Option<String>,
    pub message: String,
}
