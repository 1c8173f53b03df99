//! Bounded relaxation over the signal graph.
//!
//! Every call runs a fixed number of sweeps. Within a sweep, nodes are
//! visited in graph order and each result is committed immediately, so a
//! node later in the order already sees the values written earlier in the
//! same sweep. Cycles are legal; the sweep budget is what terminates them.

use crate::compute::kernel;
use crate::compute::plan::SweepPlan;
use crate::store::{Graph, Incoming};
use tracing::debug;

pub const DEFAULT_SWEEPS: usize = 5;

/// What a propagation call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    pub sweeps: usize,
    /// Node writes that changed a value, across all sweeps.
    pub updates: usize,
    /// False when the final sweep still changed something: the network is
    /// oscillating or has chains longer than the sweep budget.
    pub settled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    sweeps: usize,
}

impl Default for Engine {
    fn default() -> Self { Self { sweeps: DEFAULT_SWEEPS } }
}

impl Engine {
    /// A zero budget is raised to one sweep.
    pub fn new(sweeps: usize) -> Self { Self { sweeps: sweeps.max(1) } }

    pub fn sweeps(&self) -> usize { self.sweeps }

    /// Runs the relaxation in place. Never fails: missing sources read as
    /// OFF and empty fan-in yields OFF.
    pub fn run(&self, graph: &mut Graph) -> PropagationReport {
        let plan = SweepPlan::compile(graph);
        let mut updates = 0;
        let mut changed_last = false;

        for _ in 0..self.sweeps {
            changed_last = false;
            for step in 0..plan.steps() {
                let slot = plan.targets[step];
                let incoming: Incoming = plan
                    .sources(step)
                    .iter()
                    .filter_map(|&src| graph.nodes[src].value.value())
                    .collect();

                let next = kernel::evaluate(&graph.nodes[slot], &incoming);
                if next != graph.nodes[slot].value {
                    updates += 1;
                    changed_last = true;
                }
                graph.set_value_at(slot, next);
            }
        }

        let report = PropagationReport { sweeps: self.sweeps, updates, settled: !changed_last };
        debug!(
            nodes = graph.len(),
            connections = graph.connections().len(),
            sweeps = report.sweeps,
            updates = report.updates,
            settled = report.settled,
            "relaxation finished"
        );
        report
    }
}

/// Runs the default five-sweep relaxation.
pub fn propagate(graph: &mut Graph) -> PropagationReport {
    Engine::default().run(graph)
}
