use crate::store::{Graph, NodeKind};

/// Fan-in table compiled from a graph for one propagation call.
///
/// **Layout:**
/// - `targets[k]` is the node slot evaluated at step k of every sweep (node
///   order, INPUT nodes skipped).
/// - `sources_flat[ranges[k]]` are the slots feeding step k, in connection
///   order. Dangling connections are dropped here since they only ever read
///   as OFF.
#[derive(Debug, Clone, Default)]
pub struct SweepPlan {
    pub targets: Vec<usize>,
    pub sources_flat: Vec<usize>,
    pub ranges: Vec<(u32, u32)>,
}

impl SweepPlan {
    pub fn compile(graph: &Graph) -> Self {
        let count = graph.len();

        // 1. Bucket live source slots per target slot, preserving connection order.
        let mut fan_in: Vec<Vec<usize>> = vec![Vec::new(); count];
        for conn in graph.connections() {
            if let (Some(src), Some(dst)) = (graph.slot_of(conn.from), graph.slot_of(conn.to)) {
                fan_in[dst].push(src);
            }
        }

        // 2. Flatten (CSR) in sweep order
        let mut plan = SweepPlan {
            targets: Vec::with_capacity(count),
            sources_flat: Vec::with_capacity(graph.connections().len()),
            ranges: Vec::with_capacity(count),
        };
        for (slot, node) in graph.nodes().iter().enumerate() {
            if node.kind == NodeKind::Input {
                continue;
            }
            let start = plan.sources_flat.len() as u32;
            plan.sources_flat.extend_from_slice(&fan_in[slot]);
            plan.targets.push(slot);
            plan.ranges.push((start, fan_in[slot].len() as u32));
        }
        plan
    }

    pub fn steps(&self) -> usize { self.targets.len() }

    #[inline(always)]
    pub fn sources(&self, step: usize) -> &[usize] {
        let (start, count) = self.ranges[step];
        &self.sources_flat[start as usize..(start + count) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Connection, NodeId, Position};

    #[test]
    fn test_plan_skips_inputs_and_dangling_sources() {
        let mut g = Graph::new();
        let i = g.add_node(NodeKind::Input, Position::default());
        let c = g.add_node(NodeKind::Competitive, Position::default());
        let o = g.add_node(NodeKind::Output, Position::default());
        g.add_connection(i, c).unwrap();
        g.add_connection(c, c).unwrap();
        g.push_connection_unchecked(Connection::new(NodeId(999), o));
        g.add_connection(i, c).unwrap();
        g.add_connection(c, o).unwrap();

        let plan = SweepPlan::compile(&g);

        assert_eq!(plan.targets, vec![1, 2]);
        assert_eq!(plan.sources(0), &[0, 1, 0]);
        assert_eq!(plan.sources(1), &[1]);
    }
}
