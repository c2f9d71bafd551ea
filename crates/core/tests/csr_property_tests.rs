use common::discount::Pricing;
use common::types::{City, Flight};
use flight_router_core::csr::FlightGraph;
use proptest::prelude::*;
use proptest::strategy::Strategy;

const NUM_NODES_STRATEGY: std::ops::Range<usize> = 1usize..10;

fn csr_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize, f64)>)> {
    NUM_NODES_STRATEGY.prop_flat_map(|num_nodes| {
        let edge_generator = (0usize..num_nodes, 0usize..num_nodes, 0.0f64..10_000.0);
        let edges_generator = prop::collection::vec(edge_generator, 0..50);

        (proptest::strategy::Just(num_nodes), edges_generator)
    })
}

fn build(num_nodes: usize, edges: &[(usize, usize, f64)]) -> FlightGraph {
    let cities = (0..num_nodes).map(|i| City::new(format!("C{}", i))).collect();
    let flights = edges
        .iter()
        .map(|&(u, v, fare)| Flight::new(u, v, "IndiGo", fare, 60))
        .collect();
    FlightGraph::from_flights(cities, flights, &Pricing::default()).unwrap()
}

proptest! {
    /// Property: node_pointers should be monotonic
    #[test]
    fn node_pointers_monotonic((num_nodes, edges) in csr_strategy()) {
        let csr = build(num_nodes, &edges);
        for i in 0..csr.num_nodes {
            prop_assert!(csr.node_pointers[i] <= csr.node_pointers[i + 1]);
        }
    }

    /// Property: edge arrays and flight records stay aligned
    #[test]
    fn edge_arrays_length_consistent((num_nodes, edges) in csr_strategy()) {
        let csr = build(num_nodes, &edges);
        prop_assert_eq!(csr.edge_targets.len(), csr.edge_weights.len());
        prop_assert_eq!(csr.edge_targets.len(), csr.flights.len());
        prop_assert_eq!(csr.edge_targets.len(), csr.node_pointers[csr.num_nodes]); // In CSR, the last node pointer equals the total number of edges.
    }

    /// Property: all flights are included (by count)
    #[test]
    fn all_edges_included((num_nodes, edges) in csr_strategy()) {
        let csr = build(num_nodes, &edges);
        prop_assert_eq!(csr.num_edges(), edges.len());
    }

    /// Property: weights follow a stable sort by departure city, so flights from
    /// one city keep their input order.
    #[test]
    fn edge_weights_in_stable_source_order((num_nodes, edges) in csr_strategy()) {
        let csr = build(num_nodes, &edges);

        let mut sorted_edges = edges;
        sorted_edges.sort_by_key(|e| e.0);

        let expected_weights: Vec<f64> = sorted_edges.iter().map(|&(_, _, fare)| fare).collect();
        let expected_targets: Vec<usize> = sorted_edges.iter().map(|&(_, v, _)| v).collect();

        prop_assert_eq!(csr.edge_weights, expected_weights);
        prop_assert_eq!(csr.edge_targets, expected_targets);
    }

    /// Property: every edge index maps back to the city whose range contains it
    #[test]
    fn edge_sources_match_ranges((num_nodes, edges) in csr_strategy()) {
        let csr = build(num_nodes, &edges);
        for u in 0..csr.num_nodes {
            for i in csr.edges_from(u) {
                prop_assert_eq!(csr.get_edge_source_node(i).unwrap(), u);
                prop_assert_eq!(csr.flight(i).from, u);
            }
        }
    }

    /// Property: nodes with no outgoing edges have node_pointers[i] == node_pointers[i+1]
    #[test]
    fn nodes_without_edges((num_nodes, edges) in csr_strategy()) {
        let csr = build(num_nodes, &edges);

        let mut has_edges = vec![false; num_nodes];
        for &(from, _, _) in &edges {
            has_edges[from] = true;
        }

        for (i, has) in has_edges.iter().enumerate() {
            if !has {
                prop_assert_eq!(csr.node_pointers[i], csr.node_pointers[i + 1]);
            }
        }
    }
}
