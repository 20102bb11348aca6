use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::owners::OwnerIndex;
use super::Snapshot;
use crate::trace::{TraceEvent, TraceSink};
use crate::types::{Address, EdgeIdx, NodeIdx};

/// Borrowed view of one stored edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdgeRef<'a> {
    /// The owner holding the reference.
    pub from: NodeIdx,
    /// The object kept alive.
    pub to: NodeIdx,
    /// Description of the reference.
    pub label: &'a str,
}

/// Accumulates one capture's nodes and edges in index-addressed arrays.
///
/// Nodes are never materialized as objects: every per-node property lives in a
/// parallel array indexed by [`NodeIdx`], and the address map is the only way
/// in from the outside. Root and garbage flags are sparse.
#[derive(Debug, Default)]
pub struct GraphStore {
    index: FxHashMap<Address, NodeIdx>,
    addresses: Vec<Address>,
    names: Vec<String>,
    ref_counts: Vec<u64>,

    edge_from: Vec<NodeIdx>,
    edge_to: Vec<NodeIdx>,
    edge_labels: Vec<String>,

    root_known_edges: FxHashMap<NodeIdx, u64>,
    garbage: FxHashSet<NodeIdx>,
}

impl GraphStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `address` to its node index, allocating the next index on first sight.
    ///
    /// # Panics
    ///
    /// Panics when the capture already holds [`MAX_ARENA_LEN`](crate::types::MAX_ARENA_LEN) nodes.
    pub fn ensure_index(&mut self, address: Address) -> NodeIdx {
        if let Some(&idx) = self.index.get(&address) {
            return idx;
        }
        let idx = NodeIdx::next(self.addresses.len());
        self.index.insert(address, idx);
        self.addresses.push(address);
        self.names.push(String::new());
        self.ref_counts.push(0);
        idx
    }

    /// Records the reference count and name of a reference-counted node. Last write wins.
    pub fn note_ref_counted_node(&mut self, address: Address, ref_count: u64, name: &str) {
        let idx = self.ensure_index(address).as_usize();
        self.ref_counts[idx] = ref_count;
        set_name(&mut self.names[idx], name);
    }

    /// Records the name of a garbage-collected node.
    pub fn note_gc_node(&mut self, address: Address, name: &str) {
        let idx = self.ensure_index(address).as_usize();
        set_name(&mut self.names[idx], name);
    }

    /// Appends an owning edge, creating either endpoint if it was never seen.
    ///
    /// # Panics
    ///
    /// Panics when the capture already holds [`MAX_ARENA_LEN`](crate::types::MAX_ARENA_LEN) edges.
    pub fn note_edge(&mut self, from: Address, to: Address, label: &str) -> EdgeIdx {
        let from = self.ensure_index(from);
        let to = self.ensure_index(to);
        let edge = EdgeIdx::next(self.edge_from.len());
        self.edge_from.push(from);
        self.edge_to.push(to);
        self.edge_labels.push(label.to_string());
        edge
    }

    /// Flags a node as a root with `known_edges` accounted-for incoming references.
    pub fn note_root(&mut self, address: Address, known_edges: u64) {
        let idx = self.ensure_index(address);
        self.root_known_edges.insert(idx, known_edges);
    }

    /// Flags a node as a member of an uncollectable garbage cycle.
    pub fn note_garbage_cycle_member(&mut self, address: Address) {
        let idx = self.ensure_index(address);
        self.garbage.insert(idx);
    }

    /// Applies one trace observation.
    pub fn apply(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::RefCountedNode {
                address,
                ref_count,
                name,
            } => self.note_ref_counted_node(address, ref_count, &name),
            TraceEvent::GcNode { address, name, .. } => self.note_gc_node(address, &name),
            TraceEvent::Edge { from, to, label } => {
                self.note_edge(from, to, &label);
            }
            TraceEvent::Root {
                address,
                known_edges,
            } => self.note_root(address, known_edges),
            TraceEvent::Garbage { address } => self.note_garbage_cycle_member(address),
        }
    }

    /// Ends ingestion and builds the owner index over the final edge list.
    pub fn freeze(self) -> Snapshot {
        let owners = OwnerIndex::build(self.node_count(), &self.edge_to);
        debug!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            max_in_degree = owners.max_in_degree(),
            "owners.built"
        );
        Snapshot {
            store: self,
            owners,
        }
    }

    /// Looks up the node index for `address` without allocating one.
    pub fn lookup(&self, address: Address) -> Option<NodeIdx> {
        self.index.get(&address).copied()
    }

    /// Number of distinct nodes seen.
    pub fn node_count(&self) -> usize {
        self.addresses.len()
    }

    /// Number of edges recorded, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.edge_from.len()
    }

    /// Number of nodes flagged as roots.
    pub fn root_count(&self) -> usize {
        self.root_known_edges.len()
    }

    /// Number of nodes flagged as garbage.
    pub fn garbage_count(&self) -> usize {
        self.garbage.len()
    }

    /// Address of `node`.
    pub fn address(&self, node: NodeIdx) -> Address {
        self.addresses[node.as_usize()]
    }

    /// Display name of `node`; empty when no describing event arrived.
    pub fn name(&self, node: NodeIdx) -> &str {
        &self.names[node.as_usize()]
    }

    /// Reference count of `node`; zero for garbage-collected or undescribed nodes.
    pub fn ref_count(&self, node: NodeIdx) -> u64 {
        self.ref_counts[node.as_usize()]
    }

    /// Whether `node` was described as a root.
    pub fn is_root(&self, node: NodeIdx) -> bool {
        self.root_known_edges.contains_key(&node)
    }

    /// Known incoming edge count for a root; `None` for non-roots.
    pub fn known_edges(&self, node: NodeIdx) -> Option<u64> {
        self.root_known_edges.get(&node).copied()
    }

    /// Whether `node` belongs to an identified garbage cycle.
    pub fn is_garbage(&self, node: NodeIdx) -> bool {
        self.garbage.contains(&node)
    }

    /// Returns the edge stored at `edge`.
    pub fn edge(&self, edge: EdgeIdx) -> EdgeRef<'_> {
        let i = edge.as_usize();
        EdgeRef {
            from: self.edge_from[i],
            to: self.edge_to[i],
            label: &self.edge_labels[i],
        }
    }

    /// Owner endpoint of `edge`.
    #[inline]
    pub fn edge_from(&self, edge: EdgeIdx) -> NodeIdx {
        self.edge_from[edge.as_usize()]
    }
}

impl TraceSink for GraphStore {
    fn observe(&mut self, event: TraceEvent) {
        self.apply(event);
    }
}

fn set_name(slot: &mut String, name: &str) {
    slot.clear();
    slot.push_str(name);
}
