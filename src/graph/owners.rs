use crate::types::{EdgeIdx, NodeIdx};

/// Reverse adjacency over a finished edge list: node -> edges pointing at it.
///
/// Stored in compressed-sparse-row form. `offsets` has `node_count + 1`
/// entries and `edges[offsets[n]..offsets[n + 1]]` lists the edges whose
/// target is `n`, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct OwnerIndex {
    offsets: Vec<u32>,
    edges: Vec<EdgeIdx>,
}

impl OwnerIndex {
    /// Builds the index from each edge's target, `edge_to[e]` being the target of edge `e`.
    pub fn build(node_count: usize, edge_to: &[NodeIdx]) -> Self {
        let mut offsets = vec![0u32; node_count + 1];
        for to in edge_to {
            offsets[to.as_usize() + 1] += 1;
        }
        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }
        let mut cursor: Vec<u32> = offsets[..node_count].to_vec();
        let mut edges = vec![EdgeIdx(0); edge_to.len()];
        for (e, to) in edge_to.iter().enumerate() {
            let slot = &mut cursor[to.as_usize()];
            edges[*slot as usize] = EdgeIdx::next(e);
            *slot += 1;
        }
        Self { offsets, edges }
    }

    /// Edges whose target is `node`. Empty for nodes nothing points at.
    pub fn owners(&self, node: NodeIdx) -> &[EdgeIdx] {
        let i = node.as_usize();
        match (self.offsets.get(i), self.offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => &self.edges[start as usize..end as usize],
            _ => &[],
        }
    }

    /// Number of nodes covered.
    pub fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Largest number of owners any single node has.
    pub fn max_in_degree(&self) -> usize {
        self.offsets
            .windows(2)
            .map(|w| (w[1] - w[0]) as usize)
            .max()
            .unwrap_or(0)
    }
}
