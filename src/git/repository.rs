use chrono::{DateTime, TimeZone, Utc};
use git2::{ObjectType, Oid, Repository};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::git::source::CommitSource;
use crate::models::{CommitMetadata, Identity};

pub struct GitRepository {
    pub repo: Repository,
    pub path: String,
}

impl GitRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().trim().to_string();
        let repo = Repository::discover(&path_str)
            .map_err(|_| AppError::RepoNotFound(path_str.clone()))?;

        Ok(Self {
            repo,
            path: path_str,
        })
    }
}

impl CommitSource for GitRepository {
    /// Every commit object in the object database, reachable or not. Walking
    /// refs instead would stop at the first missing parent.
    fn enumerate_commits(&self) -> Result<Vec<String>> {
        let odb = self.repo.odb()?;

        let mut oids = Vec::new();
        odb.foreach(|oid| {
            oids.push(*oid);
            true
        })?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();

        // Packed and loose copies of one object are both listed.
        for oid in oids {
            if !seen.insert(oid) {
                continue;
            }

            match odb.read_header(oid) {
                Ok((_, ObjectType::Commit)) => ids.push(oid.to_string()),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable object {}: {}", oid, e.message()),
            }
        }

        ids.sort();
        tracing::info!("Enumerated {} commits in {}", ids.len(), self.path);
        Ok(ids)
    }

    fn commit_metadata(&self, id: &str) -> Result<CommitMetadata> {
        let oid = Oid::from_str(id).map_err(|_| AppError::CommitNotFound(id.to_string()))?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| AppError::CommitNotFound(format!("{} ({})", id, e.message())))?;

        commit_to_metadata(&commit)
    }
}

pub fn commit_to_metadata(commit: &git2::Commit) -> Result<CommitMetadata> {
    let author = commit.author();
    let committer = commit.committer();
    let id = commit.id().to_string();

    Ok(CommitMetadata {
        author_time: git_time_to_utc(&id, author.when())?,
        committer_time: git_time_to_utc(&id, committer.when())?,
        author: signature_to_identity(&author),
        committer: signature_to_identity(&committer),
        parents: commit.parent_ids().map(|oid| oid.to_string()).collect(),
        id,
    })
}

fn signature_to_identity(sig: &git2::Signature) -> Identity {
    Identity {
        name: sig.name().unwrap_or("Unknown").to_string(),
        email: sig.email().unwrap_or("").to_string(),
    }
}

fn git_time_to_utc(id: &str, time: git2::Time) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(|| AppError::CommitNotFound(format!("{} (timestamp out of range)", id)))
}
