//! The seam between the resolver and whatever stores the commits.
//!
//! `GitRepository` is the production implementation; resolver tests use an
//! in-memory map.

use crate::error::Result;
use crate::models::CommitMetadata;

pub trait CommitSource {
    /// Every commit id the run should check, each exactly once, in no
    /// particular order.
    fn enumerate_commits(&self) -> Result<Vec<String>>;

    /// Metadata for a single commit. Fails with `AppError::CommitNotFound`
    /// when the object is missing or unreadable.
    fn commit_metadata(&self, id: &str) -> Result<CommitMetadata>;
}
