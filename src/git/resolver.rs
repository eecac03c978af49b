//! Chronological consistency resolver.
//!
//! Walks commit ancestry once per commit and assigns every commit a resolved
//! timestamp: its own time, or one second after its newest parent when the
//! own time is older than that parent. Each correction becomes a `Change`.
//!
//! The walk is depth-first but uses an explicit stack, so arbitrarily long
//! linear histories do not exhaust the call stack. A node is finalized only
//! once every parent has been resolved (or skipped).
//!
//! Used by: `main.rs` for every enumerated commit

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::git::cache::{CommitGraph, NodeSeed};
use crate::git::source::CommitSource;
use crate::models::{Change, TimeSource, TraversalError};

/// Older than or equal to any commit a real repository holds.
pub const EPOCH: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// What a finished run hands to the reports.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Keyed by commit id, so reports come out in a stable order
    pub changes: BTreeMap<String, Change>,
    pub errors: Vec<TraversalError>,
    pub graph: CommitGraph,
}

/// One frame of the explicit DFS stack.
struct Visit {
    id: String,
    next_parent: usize,
}

pub struct Resolver<'a, S: CommitSource> {
    source: &'a S,
    time_source: TimeSource,
    graph: CommitGraph,
    changes: BTreeMap<String, Change>,
    errors: Vec<TraversalError>,
    /// Read failures, so an unreadable commit is only fetched once
    unreadable: HashMap<String, String>,
}

impl<'a, S: CommitSource> Resolver<'a, S> {
    pub fn new(source: &'a S, time_source: TimeSource) -> Self {
        Self {
            source,
            time_source,
            graph: CommitGraph::new(),
            changes: BTreeMap::new(),
            errors: Vec::new(),
            unreadable: HashMap::new(),
        }
    }

    /// Enumerate every commit in the source and resolve each of them.
    pub fn run(source: &'a S, time_source: TimeSource) -> Result<Resolution> {
        let start = Instant::now();
        let ids = source.enumerate_commits()?;

        let mut resolver = Self::new(source, time_source);
        for id in &ids {
            // Failures are already recorded; the next commit is independent.
            let _ = resolver.resolve(id);
        }

        let resolution = resolver.finish();
        let stats = resolution.graph.stats();
        tracing::info!(
            "Resolved {} commits ({} roots, {} merges, {} edges) in {:?}: {} changes, {} errors",
            stats.total_commits,
            stats.root_commits,
            stats.merge_commits,
            stats.edges,
            start.elapsed(),
            resolution.changes.len(),
            resolution.errors.len()
        );

        Ok(resolution)
    }

    /// Resolved timestamp of `id`, resolving its whole unresolved ancestry
    /// first. Cheap for a commit that an earlier call already reached.
    pub fn resolve(&mut self, id: &str) -> Result<DateTime<Utc>> {
        if let Some(node) = self.graph.get(id) {
            return node
                .resolved
                .ok_or_else(|| AppError::Internal(format!("commit {} left unresolved", id)));
        }

        self.register(id, None)?;

        let mut stack = vec![Visit {
            id: id.to_string(),
            next_parent: 0,
        }];

        while let Some(top) = stack.last_mut() {
            let next = self
                .graph
                .get(&top.id)
                .and_then(|node| node.parents.get(top.next_parent))
                .cloned();

            let Some(parent_id) = next else {
                if let Some(done) = stack.pop() {
                    self.finalize(&done.id);
                }
                continue;
            };

            top.next_parent += 1;
            let child_id = top.id.clone();

            let parent_resolved = self.graph.get(&parent_id).map(|p| p.resolved.is_some());
            match parent_resolved {
                Some(true) => {}
                Some(false) => {
                    // Still on the stack: the parent descends from this child.
                    let err = AppError::Cycle(parent_id.clone());
                    self.record_error(&parent_id, Some(&child_id), &err.to_string());
                }
                None => {
                    if self.register(&parent_id, Some(&child_id)).is_ok() {
                        stack.push(Visit {
                            id: parent_id,
                            next_parent: 0,
                        });
                    }
                }
            }
        }

        self.graph
            .resolved(id)
            .ok_or_else(|| AppError::Internal(format!("commit {} left unresolved", id)))
    }

    pub fn finish(self) -> Resolution {
        Resolution {
            changes: self.changes,
            errors: self.errors,
            graph: self.graph,
        }
    }

    /// Read a commit and add it to the graph. Read failures are recorded
    /// against `child_id` and returned.
    fn register(&mut self, id: &str, child_id: Option<&str>) -> Result<()> {
        if let Some(message) = self.unreadable.get(id).cloned() {
            self.record_error(id, child_id, &message);
            return Err(AppError::CommitNotFound(id.to_string()));
        }

        let source = self.source;
        let time_source = self.time_source;
        let result = self
            .graph
            .get_or_create(id, || {
                let meta = source.commit_metadata(id)?;
                Ok(NodeSeed {
                    timestamp: meta.time(time_source),
                    parents: meta.parents,
                })
            })
            .map(|_| ());

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                self.unreadable.insert(id.to_string(), message.clone());
                self.record_error(id, child_id, &message);
                Err(e)
            }
        }
    }

    /// Every parent of `id` is resolved or skipped; pick the newest one and
    /// correct `id` if it predates it.
    fn finalize(&mut self, id: &str) {
        let Some(node) = self.graph.get(id) else {
            return;
        };
        let timestamp = node.timestamp;
        let parents = node.parents.clone();

        let mut best_time = EPOCH;
        let mut best_parent: Option<String> = None;

        for parent_id in &parents {
            // Unreadable parents are absent, cyclic ones are unresolved.
            let Some(parent_time) = self.graph.resolved(parent_id) else {
                continue;
            };

            self.graph.register_child(parent_id, id);

            // Strict: among equal maxima the first parent wins.
            if parent_time > best_time {
                best_time = parent_time;
                best_parent = Some(parent_id.clone());
            }
        }

        let resolved = if timestamp >= best_time {
            timestamp
        } else if let Some(corrected) = best_time.checked_add_signed(TimeDelta::seconds(1)) {
            tracing::debug!(
                "Commit {} predates parent {:?}: {} -> {}",
                id,
                best_parent,
                timestamp,
                corrected
            );
            self.changes.insert(
                id.to_string(),
                Change {
                    commit_id: id.to_string(),
                    original: timestamp,
                    corrected,
                    causing_parent: best_parent,
                },
            );
            corrected
        } else {
            // Nothing comes after the newest representable time; keep the
            // parent's time and report the commit instead of correcting it.
            let parent_id = best_parent.unwrap_or_default();
            let err = AppError::TimestampOverflow(parent_id.clone());
            self.record_error(&parent_id, Some(id), &err.to_string());
            best_time
        };

        self.graph.record_resolved(id, resolved);
    }

    fn record_error(&mut self, id: &str, child_id: Option<&str>, message: &str) {
        match child_id {
            Some(child) => tracing::warn!("Skipping parent {} of {}: {}", id, child, message),
            None => tracing::warn!("Skipping commit {}: {}", id, message),
        }

        self.errors.push(TraversalError {
            commit_id: id.to_string(),
            child_id: child_id.map(str::to_string),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitMetadata, Identity};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// In-memory commit store. Counts reads so memoization can be checked.
    #[derive(Default)]
    struct FakeSource {
        commits: HashMap<String, CommitMetadata>,
        order: Vec<String>,
        reads: RefCell<HashMap<String, usize>>,
    }

    impl FakeSource {
        fn add(&mut self, id: &str, author: i64, parents: &[&str]) -> &mut Self {
            self.add_with_committer(id, author, author, parents)
        }

        fn add_with_committer(
            &mut self,
            id: &str,
            author: i64,
            committer: i64,
            parents: &[&str],
        ) -> &mut Self {
            let who = Identity {
                name: "Test User".into(),
                email: "test@example.com".into(),
            };
            self.commits.insert(
                id.to_string(),
                CommitMetadata {
                    id: id.to_string(),
                    author: who.clone(),
                    committer: who,
                    author_time: at(author),
                    committer_time: at(committer),
                    parents: parents.iter().map(|p| p.to_string()).collect(),
                },
            );
            self.order.push(id.to_string());
            self
        }

        fn reads(&self, id: &str) -> usize {
            self.reads.borrow().get(id).copied().unwrap_or(0)
        }
    }

    impl CommitSource for FakeSource {
        fn enumerate_commits(&self) -> Result<Vec<String>> {
            Ok(self.order.clone())
        }

        fn commit_metadata(&self, id: &str) -> Result<CommitMetadata> {
            *self.reads.borrow_mut().entry(id.to_string()).or_default() += 1;
            self.commits
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::CommitNotFound(id.to_string()))
        }
    }

    fn run(source: &FakeSource) -> Resolution {
        Resolver::run(source, TimeSource::Author).unwrap()
    }

    #[test]
    fn linear_chain_corrects_only_the_offender() {
        let mut source = FakeSource::default();
        source.add("A", 100, &[]).add("B", 50, &["A"]).add("C", 200, &["B"]);

        let resolution = run(&source);

        assert_eq!(resolution.changes.len(), 1);
        let change = &resolution.changes["B"];
        assert_eq!(change.original, at(50));
        assert_eq!(change.corrected, at(101));
        assert_eq!(change.causing_parent.as_deref(), Some("A"));
        assert_eq!(resolution.graph.resolved("C"), Some(at(200)));
    }

    #[test]
    fn correction_propagates_down_the_chain() {
        let mut source = FakeSource::default();
        source.add("A", 100, &[]).add("B", 50, &["A"]).add("C", 90, &["B"]);

        let resolution = run(&source);

        let change = &resolution.changes["C"];
        assert_eq!(change.original, at(90));
        assert_eq!(change.corrected, at(102));
        assert_eq!(change.causing_parent.as_deref(), Some("B"));
        assert!(resolution.changes.contains_key("B"));
    }

    #[test]
    fn merge_tie_goes_to_first_parent() {
        let mut source = FakeSource::default();
        source
            .add("P1", 300, &[])
            .add("P2", 300, &[])
            .add("M", 10, &["P1", "P2"]);

        let resolution = run(&source);

        let change = &resolution.changes["M"];
        assert_eq!(change.corrected, at(301));
        assert_eq!(change.causing_parent.as_deref(), Some("P1"));
    }

    #[test]
    fn merge_picks_newest_parent() {
        let mut source = FakeSource::default();
        source
            .add("P1", 200, &[])
            .add("P2", 300, &[])
            .add("M", 10, &["P1", "P2"]);

        let resolution = run(&source);

        let change = &resolution.changes["M"];
        assert_eq!(change.corrected, at(301));
        assert_eq!(change.causing_parent.as_deref(), Some("P2"));
    }

    #[test]
    fn equal_to_parent_is_not_a_violation() {
        let mut source = FakeSource::default();
        source.add("A", 100, &[]).add("B", 100, &["A"]);

        let resolution = run(&source);

        assert!(resolution.changes.is_empty());
        assert_eq!(resolution.graph.resolved("B"), Some(at(100)));
    }

    #[test]
    fn roots_after_epoch_never_change() {
        let mut source = FakeSource::default();
        source.add("R1", 1, &[]).add("R2", 0, &[]);

        let resolution = run(&source);

        assert!(resolution.changes.is_empty());
        assert_eq!(resolution.graph.resolved("R1"), Some(at(1)));
        assert_eq!(resolution.graph.resolved("R2"), Some(at(0)));
    }

    #[test]
    fn root_before_epoch_is_moved_past_it() {
        let mut source = FakeSource::default();
        source.add("R", -10, &[]);

        let resolution = run(&source);

        let change = &resolution.changes["R"];
        assert_eq!(change.corrected, at(1));
        assert_eq!(change.causing_parent, None);
    }

    #[test]
    fn shared_ancestors_are_read_and_resolved_once() {
        let mut source = FakeSource::default();
        // Enumerate children before their ancestors to force cache hits.
        source
            .add("M", 10, &["L", "R"])
            .add("L", 20, &["B"])
            .add("R", 30, &["B"])
            .add("B", 500, &[]);

        let resolution = run(&source);

        for id in ["M", "L", "R", "B"] {
            assert_eq!(source.reads(id), 1, "commit {} read more than once", id);
        }
        assert_eq!(resolution.changes.len(), 3);
        assert_eq!(resolution.changes["L"].corrected, at(501));
        assert_eq!(resolution.changes["R"].corrected, at(501));
        assert_eq!(resolution.changes["M"].corrected, at(502));
        assert_eq!(resolution.changes["M"].causing_parent.as_deref(), Some("L"));
        assert_eq!(resolution.graph.children("B"), ["L".to_string(), "R".to_string()]);
    }

    #[test]
    fn resolving_twice_returns_the_same_time() {
        let mut source = FakeSource::default();
        source.add("A", 100, &[]).add("B", 50, &["A"]);

        let mut resolver = Resolver::new(&source, TimeSource::Author);
        let first = resolver.resolve("B").unwrap();
        let second = resolver.resolve("B").unwrap();
        let resolution = resolver.finish();

        assert_eq!(first, at(101));
        assert_eq!(first, second);
        assert_eq!(resolution.changes.len(), 1);
        assert_eq!(source.reads("B"), 1);
    }

    #[test]
    fn every_change_moves_forward_past_its_parent() {
        let mut source = FakeSource::default();
        source
            .add("A", 1000, &[])
            .add("B", 10, &["A"])
            .add("C", 900, &["A"])
            .add("D", 5, &["B", "C"])
            .add("E", 2000, &["D"])
            .add("F", 3, &["E", "B"]);

        let resolution = run(&source);

        assert!(!resolution.changes.is_empty());
        for change in resolution.changes.values() {
            let parent = change.causing_parent.as_deref().unwrap();
            let parent_time = resolution.graph.resolved(parent).unwrap();
            assert!(change.corrected > parent_time);
            assert!(change.corrected > change.original);
            assert_eq!(resolution.graph.resolved(&change.commit_id), Some(change.corrected));
        }
        assert!(!resolution.changes.contains_key("E"));
    }

    #[test]
    fn missing_parent_is_skipped_and_reported() {
        let mut source = FakeSource::default();
        source
            .add("A", 100, &[])
            .add("B", 50, &["gone", "A"])
            .add("C", 40, &["gone"]);

        let resolution = run(&source);

        assert_eq!(resolution.changes["B"].causing_parent.as_deref(), Some("A"));
        assert!(!resolution.changes.contains_key("C"));
        assert_eq!(resolution.graph.resolved("C"), Some(at(40)));
        assert!(resolution.graph.get("gone").is_none());

        assert_eq!(source.reads("gone"), 1);
        let skipped: Vec<_> = resolution
            .errors
            .iter()
            .map(|e| (e.commit_id.as_str(), e.child_id.as_deref()))
            .collect();
        assert_eq!(skipped, vec![("gone", Some("B")), ("gone", Some("C"))]);
    }

    #[test]
    fn unreadable_enumerated_commit_is_reported_without_child() {
        let mut source = FakeSource::default();
        source.add("A", 100, &[]);
        source.order.push("ghost".to_string());

        let resolution = run(&source);

        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.errors[0].commit_id, "ghost");
        assert_eq!(resolution.errors[0].child_id, None);
        assert!(resolution.graph.get("ghost").is_none());
    }

    #[test]
    fn cycle_is_reported_instead_of_looping() {
        let mut source = FakeSource::default();
        source.add("A", 100, &["B"]).add("B", 50, &["A"]);

        let resolution = run(&source);

        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.errors[0].commit_id, "A");
        assert_eq!(resolution.errors[0].child_id.as_deref(), Some("B"));
        // Each side resolves without the edge that closes the loop.
        assert!(resolution.changes.is_empty());
        assert_eq!(resolution.graph.resolved("A"), Some(at(100)));
        assert_eq!(resolution.graph.resolved("B"), Some(at(50)));
    }

    #[test]
    fn parent_at_the_end_of_time_is_reported_not_corrected() {
        let last = DateTime::<Utc>::MAX_UTC.timestamp();
        let mut source = FakeSource::default();
        source.add("A", last, &[]).add("B", 0, &["A"]).add("C", 5, &["B"]);

        let resolution = run(&source);

        assert!(resolution.changes.is_empty());
        assert_eq!(resolution.graph.resolved("B"), Some(at(last)));
        assert_eq!(resolution.errors.len(), 2);
        assert_eq!(resolution.errors[0].commit_id, "A");
        assert_eq!(resolution.errors[0].child_id.as_deref(), Some("B"));
        assert_eq!(resolution.errors[1].commit_id, "B");
        assert_eq!(resolution.errors[1].child_id.as_deref(), Some("C"));
    }

    #[test]
    fn committer_mode_reads_committer_time() {
        let mut source = FakeSource::default();
        source
            .add_with_committer("A", 100, 100, &[])
            .add_with_committer("B", 200, 50, &["A"]);

        let author = Resolver::run(&source, TimeSource::Author).unwrap();
        let committer = Resolver::run(&source, TimeSource::Committer).unwrap();

        assert!(author.changes.is_empty());
        assert_eq!(committer.changes["B"].corrected, at(101));
    }

    #[test]
    fn deep_linear_history_does_not_overflow() {
        let mut source = FakeSource::default();
        let depth = 100_000;
        source.add("c0", 1_000_000, &[]);
        for i in 1..depth {
            let parent = format!("c{}", i - 1);
            source.add(&format!("c{}", i), 10, &[parent.as_str()]);
        }
        // Start from the tip so the whole chain sits on one stack.
        source.order.reverse();

        let resolution = run(&source);

        assert_eq!(resolution.changes.len(), depth - 1);
        let tip = format!("c{}", depth - 1);
        assert_eq!(
            resolution.changes[&tip].corrected,
            at(1_000_000 + (depth as i64 - 1))
        );
    }
}
