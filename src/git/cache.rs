//! Commit graph cache for the consistency resolver.
//!
//! Holds one node per commit visited during a run, keyed by commit id:
//! - Nodes are registered once; a second lookup returns the cached node
//! - Child edges are added as the walk discovers them
//! - The resolved timestamp is written exactly once per node
//!
//! No traversal logic lives here. The graph is working state for one run.
//!
//! Used by: `Resolver` in resolver.rs, and the long report for child lists

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::Result;

/// What the cache needs to create a node it has not seen yet.
#[derive(Debug, Clone)]
pub struct NodeSeed {
    pub timestamp: DateTime<Utc>,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommitNode {
    pub id: String,
    /// The commit's own time in the configured time source
    pub timestamp: DateTime<Utc>,
    /// `None` while the node is still being resolved
    pub resolved: Option<DateTime<Utc>>,
    pub parents: Vec<String>,
    /// Filled in as children are discovered, in discovery order
    pub children: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CommitGraph {
    nodes: HashMap<String, CommitNode>,
}

impl CommitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached node for `id`, or build one from `seed` and cache it.
    ///
    /// The bool is `true` when the node already existed. `seed` is only called
    /// for unknown ids; if it fails nothing is inserted.
    pub fn get_or_create<F>(&mut self, id: &str, seed: F) -> Result<(&CommitNode, bool)>
    where
        F: FnOnce() -> Result<NodeSeed>,
    {
        if self.nodes.contains_key(id) {
            return Ok((&self.nodes[id], true));
        }

        let NodeSeed { timestamp, parents } = seed()?;
        let node = self.nodes.entry(id.to_string()).or_insert(CommitNode {
            id: id.to_string(),
            timestamp,
            resolved: None,
            parents,
            children: Vec::new(),
        });

        Ok((node, false))
    }

    /// Add `child_id` under `parent_id`. Duplicates and unknown parents are
    /// ignored.
    pub fn register_child(&mut self, parent_id: &str, child_id: &str) {
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            if !parent.children.iter().any(|c| c == child_id) {
                parent.children.push(child_id.to_string());
            }
        }
    }

    /// Store the resolved timestamp of a node. Calling this twice for the same
    /// node is a bug in the caller.
    pub fn record_resolved(&mut self, id: &str, value: DateTime<Utc>) {
        if let Some(node) = self.nodes.get_mut(id) {
            debug_assert!(node.resolved.is_none(), "commit {} resolved twice", node.id);
            node.resolved = Some(value);
        }
    }

    pub fn get(&self, id: &str) -> Option<&CommitNode> {
        self.nodes.get(id)
    }

    pub fn resolved(&self, id: &str) -> Option<DateTime<Utc>> {
        self.nodes.get(id).and_then(|node| node.resolved)
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Get graph statistics for logging
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_commits: self.nodes.len(),
            root_commits: self.nodes.values().filter(|n| n.parents.is_empty()).count(),
            merge_commits: self.nodes.values().filter(|n| n.parents.len() > 1).count(),
            edges: self.nodes.values().map(|n| n.children.len()).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub total_commits: usize,
    pub root_commits: usize,
    pub merge_commits: usize,
    pub edges: usize,
}
