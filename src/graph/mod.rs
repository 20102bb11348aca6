//! Captured object graph: ingestion store and the derived owner index.

mod owners;
mod store;

pub use owners::OwnerIndex;
pub use store::{EdgeRef, GraphStore};

use crate::types::{Address, NodeIdx};

/// A finished capture: the frozen store plus its owner index.
///
/// Produced by [`GraphStore::freeze`]; read-only for the rest of the capture.
#[derive(Debug)]
pub struct Snapshot {
    store: GraphStore,
    owners: OwnerIndex,
}

impl Snapshot {
    /// The underlying node and edge arrays.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Reverse adjacency over the store's edges.
    pub fn owners(&self) -> &OwnerIndex {
        &self.owners
    }

    /// Resolves an address observed during capture.
    pub fn lookup(&self, address: Address) -> Option<NodeIdx> {
        self.store.lookup(address)
    }
}
