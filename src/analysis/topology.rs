//! Structural analysis of a signal graph.
//!
//! Propagation itself never needs any of this: it is a bounded sweep that
//! tolerates cycles. The report tells a caller *whether* a single call can be
//! expected to settle (acyclic, chains no longer than the sweep budget).

use crate::store::{Graph, NodeId};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopologyReport {
    /// Each group is a strongly connected component that can feed itself
    /// (two or more nodes, or one node with a self-connection). Ids are sorted.
    pub cyclic_groups: Vec<Vec<NodeId>>,
    /// Longest path in hops, when the graph is acyclic.
    pub longest_chain: Option<usize>,
    /// Connections with a missing endpoint.
    pub dangling_connections: usize,
}

impl TopologyReport {
    pub fn is_acyclic(&self) -> bool { self.cyclic_groups.is_empty() }

    /// True when even the least favorable node order settles within `sweeps`.
    pub fn fits_sweep_budget(&self, sweeps: usize) -> bool {
        self.longest_chain.is_some_and(|hops| hops <= sweeps)
    }
}

/// Snapshot of the live part of the graph. Parallel connections become
/// parallel edges; dangling ones are left out.
fn snapshot(graph: &Graph) -> (DiGraph<NodeId, ()>, HashMap<NodeId, NodeIndex>, usize) {
    let mut g = DiGraph::with_capacity(graph.len(), graph.connections().len());
    let index: HashMap<NodeId, NodeIndex> =
        graph.nodes().iter().map(|n| (n.id, g.add_node(n.id))).collect();

    let mut dangling = 0;
    for conn in graph.connections() {
        match (index.get(&conn.from), index.get(&conn.to)) {
            (Some(&a), Some(&b)) => { g.add_edge(a, b, ()); }
            _ => dangling += 1,
        }
    }
    (g, index, dangling)
}

pub fn analyze(graph: &Graph) -> TopologyReport {
    let (g, _, dangling_connections) = snapshot(graph);

    let mut cyclic_groups: Vec<Vec<NodeId>> = tarjan_scc(&g)
        .into_iter()
        .filter(|scc| scc.len() > 1 || g.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut ids: Vec<NodeId> = scc.into_iter().map(|ix| g[ix]).collect();
            ids.sort();
            ids
        })
        .collect();
    cyclic_groups.sort();

    // Longest path by DP over a topological order.
    let longest_chain = toposort(&g, None).ok().map(|order| {
        let mut depth = vec![0usize; g.node_count()];
        for ix in order {
            let d = depth[ix.index()];
            for next in g.neighbors(ix) {
                depth[next.index()] = depth[next.index()].max(d + 1);
            }
        }
        depth.into_iter().max().unwrap_or(0)
    });

    TopologyReport { cyclic_groups, longest_chain, dangling_connections }
}

/// Every node reachable from `start` (inclusive).
pub fn downstream_from(graph: &Graph, start: &[NodeId]) -> HashSet<NodeId> {
    let (g, index, _) = snapshot(graph);
    let mut visited = HashSet::new();
    let mut dfs = Dfs::empty(&g);
    for id in start {
        let Some(&ix) = index.get(id) else { continue };
        dfs.move_to(ix);
        while let Some(node) = dfs.next(&g) {
            visited.insert(g[node]);
        }
    }
    visited
}
