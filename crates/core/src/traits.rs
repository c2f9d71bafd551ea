use common::{error::Error, types::PathResult};

use super::csr::FlightGraph;
use super::tree::ShortestPathTree;

/// Trait for single-source shortest path solvers over a `FlightGraph`.
pub trait ShortestPathSolver {
    /// Display name used in comparison reports.
    fn name(&self) -> &'static str;

    /// Computes distances and predecessors from `source` to every city.
    ///
    /// Returns `Err(e)` if `source` is out of bounds or the solver detects a
    /// condition under which shortest paths are undefined.
    fn shortest_paths(&self, graph: &FlightGraph, source: usize) -> Result<ShortestPathTree, Error>;

    /// Cheapest route between two city codes.
    ///
    /// Both codes are validated before any search runs; identical codes yield
    /// the empty route.
    fn find_route(&self, graph: &FlightGraph, from: &str, to: &str) -> Result<PathResult, Error> {
        let source = graph.city_id(from)?;
        let target = graph.city_id(to)?;

        if source == target {
            return Ok(PathResult::empty());
        }

        let tree = self.shortest_paths(graph, source)?;
        tree.path_to(graph, target)
    }
}
