pub mod cache;
pub mod repository;
pub mod resolver;
pub mod source;

pub use repository::GitRepository;
pub use resolver::{Resolution, Resolver};
pub use source::CommitSource;
