//! Data types shared between the resolver and the reports.
//!
//! - `commit`: CommitMetadata, Identity, TimeSource
//! - `change`: Change, TraversalError
//! - `rfc3339`: serde adapter for timestamps

pub mod change;
pub mod commit;
pub mod rfc3339;

pub use change::*;
pub use commit::*;
