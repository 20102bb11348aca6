//! Backward breadth-first search from a leaked object to the nearest root.

use std::collections::VecDeque;

use crate::graph::Snapshot;
use crate::types::{Address, EdgeIdx, NodeIdx};

const NO_PARENT: u32 = u32::MAX;

/// Ownership chain from a target to a root.
///
/// `nodes[0]` is the target and the last node is the root. `edges[i]` is the
/// edge through which `nodes[i + 1]` owns `nodes[i]`, so
/// `edges.len() == nodes.len() - 1`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetentionPath {
    /// Nodes in target-to-root order.
    pub nodes: Vec<NodeIdx>,
    /// Edges traversed between consecutive nodes.
    pub edges: Vec<EdgeIdx>,
}

impl RetentionPath {
    /// Number of edges in the path.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when the target is itself a root.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The leaked object the search started from.
    pub fn target(&self) -> NodeIdx {
        self.nodes[0]
    }

    /// The root that keeps the target alive.
    pub fn root(&self) -> NodeIdx {
        self.nodes[self.nodes.len() - 1]
    }
}

/// Result of one search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SearchOutcome {
    /// A shortest ownership chain to a root.
    Found(RetentionPath),
    /// Every owner was explored without reaching a root.
    Exhausted {
        /// The node the search started from.
        target: NodeIdx,
        /// The target itself was flagged as a garbage-cycle member.
        garbage: bool,
        /// Number of distinct nodes reached, target included.
        visited: usize,
    },
    /// The address was never observed during capture.
    Missing,
}

/// Runs backward searches over one snapshot.
///
/// Scratch buffers are sized once per snapshot and reused across searches;
/// a generation stamp stands in for clearing the visited set.
pub struct PathFinder<'a> {
    snapshot: &'a Snapshot,
    stamp: u32,
    visited: Vec<u32>,
    parent_node: Vec<u32>,
    parent_edge: Vec<u32>,
    queue: VecDeque<NodeIdx>,
}

impl<'a> PathFinder<'a> {
    /// Creates a finder over `snapshot`.
    pub fn new(snapshot: &'a Snapshot) -> Self {
        let n = snapshot.store().node_count();
        Self {
            snapshot,
            stamp: 0,
            visited: vec![0; n],
            parent_node: vec![NO_PARENT; n],
            parent_edge: vec![NO_PARENT; n],
            queue: VecDeque::new(),
        }
    }

    /// Searches from the node observed at `address`.
    pub fn find_address(&mut self, address: Address) -> SearchOutcome {
        match self.snapshot.lookup(address) {
            Some(target) => self.find_path(target),
            None => SearchOutcome::Missing,
        }
    }

    /// Searches from `target` toward the nearest root, following edges from owned to owner.
    pub fn find_path(&mut self, target: NodeIdx) -> SearchOutcome {
        let store = self.snapshot.store();
        let owners = self.snapshot.owners();
        if target.as_usize() >= self.visited.len() {
            return SearchOutcome::Missing;
        }
        let stamp = self.next_stamp();
        self.queue.clear();
        self.visited[target.as_usize()] = stamp;
        self.parent_node[target.as_usize()] = NO_PARENT;
        self.queue.push_back(target);
        let mut reached = 1usize;

        while let Some(current) = self.queue.pop_front() {
            if store.is_root(current) {
                return SearchOutcome::Found(self.reconstruct(target, current));
            }
            for &edge in owners.owners(current) {
                let owner = store.edge_from(edge);
                let slot = owner.as_usize();
                if self.visited[slot] != stamp {
                    self.visited[slot] = stamp;
                    self.parent_node[slot] = current.0;
                    self.parent_edge[slot] = edge.0;
                    self.queue.push_back(owner);
                    reached += 1;
                }
            }
        }

        SearchOutcome::Exhausted {
            target,
            garbage: store.is_garbage(target),
            visited: reached,
        }
    }

    fn next_stamp(&mut self) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.visited.fill(0);
            self.stamp = 1;
        }
        self.stamp
    }

    fn reconstruct(&self, target: NodeIdx, root: NodeIdx) -> RetentionPath {
        let mut nodes = vec![root];
        let mut edges = Vec::new();
        let mut cur = root;
        while cur != target {
            edges.push(EdgeIdx(self.parent_edge[cur.as_usize()]));
            cur = NodeIdx(self.parent_node[cur.as_usize()]);
            nodes.push(cur);
        }
        nodes.reverse();
        edges.reverse();
        RetentionPath { nodes, edges }
    }
}
