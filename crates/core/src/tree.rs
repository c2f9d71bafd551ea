use common::error::Error;
use common::types::{CityId, PathResult};

use super::csr::FlightGraph;

/// Output of a single-source solver: distances to every city plus the CSR
/// index of the edge that last improved each one.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPathTree {
    pub source: CityId,
    pub distances: Vec<f64>,
    pub pred_edge_idx: Vec<Option<usize>>,
}

impl ShortestPathTree {
    /// A tree with only the source settled at distance 0.
    pub fn rooted_at(source: CityId, num_nodes: usize) -> Self {
        let mut distances = vec![f64::INFINITY; num_nodes];
        distances[source] = 0.0;

        ShortestPathTree {
            source,
            distances,
            pred_edge_idx: vec![None; num_nodes],
        }
    }

    pub fn distance(&self, city: CityId) -> f64 {
        self.distances[city]
    }

    pub fn is_reachable(&self, city: CityId) -> bool {
        self.distances[city].is_finite()
    }

    /// Walks predecessor edges back from `target` and returns the route.
    ///
    /// Backtracking is bounded by the number of cities; a longer chain means
    /// the predecessor array contains a cycle.
    ///
    /// # Errors
    /// - `Error::Unreachable` when `target` has infinite distance.
    /// - `Error::PathReconstructionFailed` on a broken or cyclic chain.
    pub fn path_to(&self, graph: &FlightGraph, target: CityId) -> Result<PathResult, Error> {
        if target >= self.distances.len() {
            return Err(Error::NodeIndexOutOfBounds(target));
        }

        if target == self.source {
            return Ok(PathResult::empty());
        }

        if !self.is_reachable(target) {
            return Err(Error::Unreachable {
                from: graph.city_code(self.source).to_string(),
                to: graph.city_code(target).to_string(),
            });
        }

        let mut edges = Vec::new();
        let mut current = target;

        while current != self.source {
            if edges.len() >= graph.num_nodes {
                return Err(Error::PathReconstructionFailed);
            }

            let edge_idx = self.pred_edge_idx[current].ok_or(Error::PathReconstructionFailed)?;
            edges.push(edge_idx);
            current = graph.get_edge_source_node(edge_idx)?;
        }

        edges.reverse();
        graph.path_result(&edges)
    }
}
