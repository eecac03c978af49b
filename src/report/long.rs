//! Long report: one block per change.
//!
//! Only ids and times are kept during the walk, so identities are read back
//! from the source here. When the causing parent was itself corrected, its
//! "current" time is the corrected one and names where that came from.

use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::git::{CommitSource, Resolution};
use crate::models::{Change, CommitMetadata, TimeSource};
use crate::report::{format_relative_time, format_timestamp};

#[derive(Debug, Serialize)]
pub struct LongRecord {
    pub commit: CommitMetadata,
    #[serde(with = "crate::models::rfc3339")]
    pub original: DateTime<Utc>,
    #[serde(with = "crate::models::rfc3339")]
    pub corrected: DateTime<Utc>,
    /// Direct children the corrected time feeds into
    pub children: Vec<String>,
    pub parent: Option<ParentRecord>,
}

#[derive(Debug, Serialize)]
pub struct ParentRecord {
    pub commit: CommitMetadata,
    #[serde(with = "crate::models::rfc3339")]
    pub current: DateTime<Utc>,
    /// Present when the parent's time was corrected as well
    pub change: Option<Change>,
}

pub fn build<S: CommitSource>(
    resolution: &Resolution,
    source: &S,
    time_source: TimeSource,
) -> anyhow::Result<Vec<LongRecord>> {
    let mut records = Vec::with_capacity(resolution.changes.len());

    for change in resolution.changes.values() {
        let commit = source
            .commit_metadata(&change.commit_id)
            .with_context(|| format!("Failed to re-read commit {}", change.commit_id))?;

        let parent = match &change.causing_parent {
            Some(parent_id) => {
                let parent = source
                    .commit_metadata(parent_id)
                    .with_context(|| format!("Failed to re-read parent {}", parent_id))?;
                let parent_change = resolution.changes.get(parent_id).cloned();
                let current = parent_change
                    .as_ref()
                    .map(|c| c.corrected)
                    .unwrap_or_else(|| parent.time(time_source));

                Some(ParentRecord {
                    commit: parent,
                    current,
                    change: parent_change,
                })
            }
            None => None,
        };

        records.push(LongRecord {
            commit,
            original: change.original,
            corrected: change.corrected,
            children: resolution.graph.children(&change.commit_id).to_vec(),
            parent,
        });
    }

    Ok(records)
}

pub fn render<S: CommitSource, W: Write>(
    out: &mut W,
    resolution: &Resolution,
    source: &S,
    time_source: TimeSource,
    json: bool,
) -> anyhow::Result<()> {
    let records = build(resolution, source, time_source)?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
        return Ok(());
    }

    let now = Utc::now();
    for record in &records {
        write_record(out, record, &now)?;
    }

    Ok(())
}

fn write_record<W: Write>(
    out: &mut W,
    record: &LongRecord,
    now: &DateTime<Utc>,
) -> anyhow::Result<()> {
    writeln!(out, "---------------------------------------------")?;
    writeln!(out, "commit:       {}", record.commit.id)?;
    writeln!(out, "author:       {}", record.commit.author)?;
    writeln!(out, "committer:    {}", record.commit.committer)?;
    writeln!(
        out,
        "original:     {} ({})",
        format_timestamp(&record.original),
        format_relative_time(&record.original, now)
    )?;
    writeln!(
        out,
        "changed:      {} ({})",
        format_timestamp(&record.corrected),
        format_relative_time(&record.corrected, now)
    )?;
    if !record.children.is_empty() {
        writeln!(out, "children:     {}", record.children.join(", "))?;
    }

    let Some(parent) = &record.parent else {
        writeln!(out, "parent resulting the change: none (commit predates the Unix epoch)")?;
        return Ok(());
    };

    let current = match &parent.change {
        Some(Change {
            causing_parent: Some(source),
            ..
        }) => format!("{} (changed by commit {})", format_timestamp(&parent.current), source),
        Some(_) => format!(
            "{} (changed, predates the Unix epoch)",
            format_timestamp(&parent.current)
        ),
        None => format_timestamp(&parent.current),
    };

    writeln!(out, "parent resulting the change:")?;
    writeln!(out, "  commit:     {}", parent.commit.id)?;
    writeln!(out, "  current:    {}", current)?;
    writeln!(out, "  author:     {}", parent.commit.author)?;
    writeln!(out, "  committer:  {}", parent.commit.committer)?;

    Ok(())
}
