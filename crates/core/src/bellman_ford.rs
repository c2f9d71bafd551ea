use common::error::Error;
use tracing::{debug, warn};

use super::csr::FlightGraph;
use super::traits::ShortestPathSolver;
use super::tree::ShortestPathTree;

/// Solver implementing Bellman-Ford single-source shortest paths with
/// negative cycle detection.
///
/// Tolerates negative effective weights. Edges are relaxed in the graph's
/// CSR order on every pass, so results are reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellmanFordSolver;

impl BellmanFordSolver {
    /// Reconstructs the negative cycle after Bellman-Ford detects it.
    ///
    /// `start` is a city relaxed during the detection pass. It may sit
    /// downstream of the cycle rather than on it, so we first trace back
    /// `num_nodes` predecessors to land inside the cycle, then walk it once.
    ///
    /// # Returns
    /// City indices of the cycle in travel order, with the first city
    /// repeated at the end (`[a, b, a]` for `a -> b -> a`).
    ///
    /// # Errors
    /// Returns `Error::NodeIndexOutOfBounds` if `start` is out of bounds, or
    /// `Error::CycleReconstructionFailed` if the chain breaks.
    pub fn reconstruct_cycle(
        &self,
        start: usize,
        pred_edge_idx: &[Option<usize>],
        graph: &FlightGraph,
    ) -> Result<Vec<usize>, Error> {
        let num_nodes = graph.num_nodes;
        if start >= num_nodes {
            return Err(Error::NodeIndexOutOfBounds(start));
        }

        let mut trace_node = start;
        for _ in 0..num_nodes {
            let edge_idx = pred_edge_idx[trace_node].ok_or(Error::CycleReconstructionFailed)?;
            trace_node = graph.get_edge_source_node(edge_idx)?;
        }

        let cycle_start_node = trace_node;
        let mut cycle = vec![cycle_start_node];
        let mut current_node = cycle_start_node;

        loop {
            let edge_idx = pred_edge_idx[current_node].ok_or(Error::CycleReconstructionFailed)?;
            current_node = graph.get_edge_source_node(edge_idx)?;
            cycle.push(current_node);

            if current_node == cycle_start_node {
                break;
            }

            if cycle.len() > num_nodes + 1 {
                return Err(Error::CycleReconstructionFailed);
            }
        }

        cycle.reverse();
        Ok(cycle)
    }
}

impl ShortestPathSolver for BellmanFordSolver {
    fn name(&self) -> &'static str {
        "Bellman-Ford"
    }

    /// Relaxes every edge up to |V|-1 times, stopping early once a pass
    /// changes nothing, then runs one detection pass.
    ///
    /// # Returns
    /// - `Ok(tree)` → distances and predecessors from `source`.
    /// - `Err(Error::NegativeCycle { .. })` → a negative cycle is reachable
    ///   from `source`; the error names the first edge that still relaxed.
    /// - `Err(Error::NodeIndexOutOfBounds)` → `source` is not a city.
    fn shortest_paths(&self, graph: &FlightGraph, source: usize) -> Result<ShortestPathTree, Error> {
        if source >= graph.num_nodes {
            return Err(Error::NodeIndexOutOfBounds(source));
        }

        let num_nodes = graph.num_nodes;
        let mut tree = ShortestPathTree::rooted_at(source, num_nodes);
        let mut passes = 0;

        for _ in 0..num_nodes.saturating_sub(1) {
            passes += 1;
            if !relax_all(graph, &mut tree) {
                break;
            }
        }

        // Detection pass. Anything that still improves lies on, or downstream
        // of, a negative cycle.
        let mut trigger: Option<usize> = None;
        let mut last_relaxed: Option<usize> = None;

        for u in 0..num_nodes {
            if !tree.distances[u].is_finite() {
                continue;
            }

            for i in graph.edges_from(u) {
                let v = graph.edge_targets[i];
                let candidate = tree.distances[u] + graph.edge_weights[i];

                if candidate < tree.distances[v] {
                    trigger.get_or_insert(i);
                    tree.distances[v] = candidate;
                    tree.pred_edge_idx[v] = Some(i);
                    last_relaxed = Some(v);
                }
            }
        }

        if let (Some(edge_idx), Some(relaxed)) = (trigger, last_relaxed) {
            let from = graph.get_edge_source_node(edge_idx)?;
            let to = graph.edge_targets[edge_idx];
            let cycle = self.reconstruct_cycle(relaxed, &tree.pred_edge_idx, graph)?;

            warn!(
                from = graph.city_code(from),
                to = graph.city_code(to),
                cycle_len = cycle.len() - 1,
                "negative cycle detected"
            );

            return Err(Error::NegativeCycle {
                from: graph.city_code(from).to_string(),
                to: graph.city_code(to).to_string(),
                weight: graph.edge_weights[edge_idx],
                cycle: cycle
                    .into_iter()
                    .map(|city| graph.city_code(city).to_string())
                    .collect(),
            });
        }

        debug!(source = graph.city_code(source), passes, "bellman-ford converged");

        Ok(tree)
    }
}

/// One pass over every edge in CSR order. Returns whether any distance improved.
fn relax_all(graph: &FlightGraph, tree: &mut ShortestPathTree) -> bool {
    let mut updated = false;

    for u in 0..graph.num_nodes {
        if !tree.distances[u].is_finite() {
            continue;
        }

        for i in graph.edges_from(u) {
            let v = graph.edge_targets[i];
            let candidate = tree.distances[u] + graph.edge_weights[i];

            if candidate < tree.distances[v] {
                tree.distances[v] = candidate;
                tree.pred_edge_idx[v] = Some(i);
                updated = true;
            }
        }
    }

    updated
}
