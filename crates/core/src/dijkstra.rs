use std::cmp::Ordering;
use std::collections::BinaryHeap;

use common::error::Error;
use tracing::debug;

use super::csr::FlightGraph;
use super::traits::ShortestPathSolver;
use super::tree::ShortestPathTree;

/// Dijkstra's algorithm over effective weights.
///
/// Assumes every effective weight is non-negative. With negative weights the
/// result is undefined and nothing is flagged; use `BellmanFordSolver` for
/// graphs where discounts push fares below zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DijkstraSolver;

/// Frontier entry. `seq` records insertion order so that equal costs pop
/// first-seen first.
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    cost: f64,
    seq: u64,
    city: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    // Reversed: BinaryHeap is a max-heap and we want the cheapest, oldest entry on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ShortestPathSolver for DijkstraSolver {
    fn name(&self) -> &'static str {
        "Dijkstra"
    }

    fn shortest_paths(&self, graph: &FlightGraph, source: usize) -> Result<ShortestPathTree, Error> {
        if source >= graph.num_nodes {
            return Err(Error::NodeIndexOutOfBounds(source));
        }

        let mut tree = ShortestPathTree::rooted_at(source, graph.num_nodes);
        let mut settled = vec![false; graph.num_nodes];
        let mut frontier = BinaryHeap::with_capacity(graph.num_nodes);
        let mut seq: u64 = 0;

        frontier.push(FrontierEntry {
            cost: 0.0,
            seq,
            city: source,
        });

        while let Some(FrontierEntry { cost, city: u, .. }) = frontier.pop() {
            // Stale entry for a city already settled at a lower cost.
            if settled[u] {
                continue;
            }
            settled[u] = true;

            for i in graph.edges_from(u) {
                let v = graph.edge_targets[i];
                let candidate = cost + graph.edge_weights[i];

                if candidate < tree.distances[v] {
                    tree.distances[v] = candidate;
                    tree.pred_edge_idx[v] = Some(i);

                    seq += 1;
                    frontier.push(FrontierEntry {
                        cost: candidate,
                        seq,
                        city: v,
                    });
                }
            }
        }

        debug!(
            source = graph.city_code(source),
            settled = settled.iter().filter(|&&s| s).count(),
            pushes = seq + 1,
            "dijkstra finished"
        );

        Ok(tree)
    }
}

#[cfg(test)]
mod dijkstra_tests {
    use super::*;
    use common::discount::Pricing;
    use common::types::{City, Flight};

    fn build_graph(num_nodes: usize, edges: &[(usize, usize, f64)]) -> FlightGraph {
        let cities = (0..num_nodes).map(|i| City::new(format!("C{}", i))).collect();
        let flights = edges
            .iter()
            .map(|&(u, v, fare)| Flight::new(u, v, "IndiGo", fare, 60))
            .collect();
        FlightGraph::from_flights(cities, flights, &Pricing::default()).unwrap()
    }

    #[test]
    fn finds_cheaper_two_leg_route() {
        let graph = build_graph(3, &[(0, 1, 100.0), (1, 2, 50.0), (0, 2, 200.0)]);
        let tree = DijkstraSolver.shortest_paths(&graph, 0).unwrap();

        assert_eq!(tree.distances, vec![0.0, 100.0, 150.0]);

        let path = tree.path_to(&graph, 2).unwrap();
        assert_eq!(path.cities, vec!["C0", "C1", "C2"]);
        assert_eq!(path.total_cost, 150.0);
        assert_eq!(path.stops, 1);
    }

    #[test]
    fn unreachable_city_has_infinite_cost_and_no_path() {
        let graph = build_graph(3, &[(0, 1, 10.0)]);
        let tree = DijkstraSolver.shortest_paths(&graph, 0).unwrap();

        assert!(tree.distance(2).is_infinite());
        assert!(matches!(tree.path_to(&graph, 2), Err(Error::Unreachable { .. })));
    }

    #[test]
    fn equal_cost_routes_keep_first_seen_predecessor() {
        // Both 0->1->3 and 0->2->3 cost 20. City 1 is pushed before city 2, so
        // it settles first and is the first to relax city 3.
        let graph = build_graph(4, &[(0, 1, 10.0), (0, 2, 10.0), (1, 3, 10.0), (2, 3, 10.0)]);
        let path = DijkstraSolver.find_route(&graph, "C0", "C3").unwrap();

        assert_eq!(path.cities, vec!["C0", "C1", "C3"]);
    }

    #[test]
    fn source_equal_to_destination_is_empty_route() {
        let graph = build_graph(2, &[(0, 1, 10.0)]);
        let path = DijkstraSolver.find_route(&graph, "C1", "C1").unwrap();

        assert!(path.is_empty());
        assert_eq!(path.total_cost, 0.0);
    }

    #[test]
    fn unknown_city_is_rejected() {
        let graph = build_graph(2, &[(0, 1, 10.0)]);
        let result = DijkstraSolver.find_route(&graph, "C0", "NOPE");

        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn out_of_bounds_source_returns_error() {
        let graph = build_graph(0, &[]);
        let result = DijkstraSolver.shortest_paths(&graph, 0);

        assert_eq!(result.unwrap_err(), Error::NodeIndexOutOfBounds(0));
    }

    #[test]
    fn large_linear_graph() {
        let n = 1000;
        let edges: Vec<_> = (0..n - 1).map(|i| (i, i + 1, 1.0)).collect();
        let graph = build_graph(n, &edges);

        let tree = DijkstraSolver.shortest_paths(&graph, 0).unwrap();
        assert_eq!(tree.distance(n - 1), (n - 1) as f64);
    }
}
