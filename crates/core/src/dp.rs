use common::error::Error;
use common::types::{Constraints, PathResult};
use tracing::{debug, trace};

use super::csr::FlightGraph;

/// Constrained cheapest-route search by dynamic programming over flight count.
///
/// Slot `(level, city)` holds the labels for reaching `city` with exactly
/// `level` flights. Level `k + 1` is filled from level `k` by walking cities
/// in index order, their labels in slot order and their flights in CSR order.
/// A transition survives only if its cost stays within the budget and its
/// duration within the limit.
///
/// Without a duration limit a slot keeps a single label, the cheapest, and
/// only a strictly cheaper transition replaces it, so the first equal-cost
/// transition discovered is the one kept. With a duration limit a slot keeps
/// every label not dominated on both cost and duration, so a pricier but
/// faster prefix survives for routes that need the time.
///
/// The answer is the cheapest destination label over all levels, preferring
/// the lower level on equal cost.
///
/// Routes are walks, not necessarily simple paths: when a negative cycle is
/// reachable, the cheapest route within the leg limit may go around it and
/// revisit cities.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstrainedSolver;

/// One way of reaching a slot.
#[derive(Debug, Clone, Copy)]
struct Label {
    cost: f64,
    duration: u32,
    /// Flight taken into the slot and the label it extended one level down.
    pred: Option<(usize, usize)>,
}

/// Per-slot label lists, indexed by `level * num_nodes + city`.
struct LevelTable {
    num_nodes: usize,
    track_duration: bool,
    labels: Vec<Vec<Label>>,
}

impl LevelTable {
    fn new(levels: usize, num_nodes: usize, track_duration: bool) -> Self {
        LevelTable {
            num_nodes,
            track_duration,
            labels: vec![Vec::new(); (levels + 1) * num_nodes],
        }
    }

    fn slot(&self, level: usize, city: usize) -> usize {
        level * self.num_nodes + city
    }

    fn dominates(track_duration: bool, a: &Label, b: &Label) -> bool {
        a.cost <= b.cost && (!track_duration || a.duration <= b.duration)
    }

    /// Adds `label` unless an existing label dominates it; drops the labels it
    /// dominates. Returns whether the label was kept.
    fn insert(&mut self, slot: usize, label: Label) -> bool {
        let track_duration = self.track_duration;
        let bucket = &mut self.labels[slot];
        if bucket
            .iter()
            .any(|kept| Self::dominates(track_duration, kept, &label))
        {
            return false;
        }

        bucket.retain(|kept| !Self::dominates(track_duration, &label, kept));
        bucket.push(label);
        true
    }
}

impl ConstrainedSolver {
    pub fn name(&self) -> &'static str {
        "Dynamic Programming"
    }

    /// Cheapest route from `from` to `to` under `constraints`.
    ///
    /// # Errors
    /// - `Error::InvalidQuery` for unknown cities or invalid constraints.
    /// - `Error::Unreachable` when no sequence of flights connects the cities.
    /// - `Error::Infeasible` when routes exist but none fits the constraints.
    pub fn solve(
        &self,
        graph: &FlightGraph,
        from: &str,
        to: &str,
        constraints: &Constraints,
    ) -> Result<PathResult, Error> {
        constraints.validate()?;
        let source = graph.city_id(from)?;
        let target = graph.city_id(to)?;

        if source == target {
            return Ok(PathResult::empty());
        }

        let num_nodes = graph.num_nodes;
        // Without negative cycles a cheapest route never needs more than |V|-1 flights.
        let levels = constraints
            .max_legs()
            .min(num_nodes.saturating_sub(1).max(1));
        let budget = constraints.budget_ceiling;

        let mut table = LevelTable::new(levels, num_nodes, constraints.max_duration.is_some());
        let origin = table.slot(0, source);
        table.labels[origin].push(Label {
            cost: 0.0,
            duration: 0,
            pred: None,
        });

        for level in 0..levels {
            let mut expanded = false;

            for u in 0..num_nodes {
                let here = table.slot(level, u);

                for k in 0..table.labels[here].len() {
                    let Label {
                        cost: base_cost,
                        duration: base_duration,
                        ..
                    } = table.labels[here][k];

                    for i in graph.edges_from(u) {
                        let flight = graph.flight(i);
                        if !constraints.allows(&flight.airline) {
                            continue;
                        }

                        let new_cost = base_cost
                            + constraints.adjusted_cost(&flight.airline, graph.edge_weights[i]);
                        if new_cost > budget {
                            continue;
                        }

                        let new_duration = base_duration.saturating_add(flight.duration_minutes);
                        if constraints.max_duration.is_some_and(|limit| new_duration > limit) {
                            continue;
                        }

                        let next = table.slot(level + 1, graph.edge_targets[i]);
                        expanded |= table.insert(
                            next,
                            Label {
                                cost: new_cost,
                                duration: new_duration,
                                pred: Some((i, k)),
                            },
                        );
                    }
                }
            }

            trace!(level = level + 1, expanded, "dp level filled");

            if !expanded {
                break;
            }
        }

        // (level, label index, cost) of the cheapest destination label.
        let mut best: Option<(usize, usize, f64)> = None;
        for level in 1..=levels {
            for (k, label) in table.labels[table.slot(level, target)].iter().enumerate() {
                if !label.cost.is_finite() || label.cost > budget {
                    continue;
                }
                if best.is_none_or(|(_, _, cost)| label.cost < cost) {
                    best = Some((level, k, label.cost));
                }
            }
        }

        let Some((level, k, cost)) = best else {
            let from = from.to_string();
            let to = to.to_string();
            return Err(if graph.reachable_from(source)[target] {
                Error::Infeasible { from, to }
            } else {
                Error::Unreachable { from, to }
            });
        };

        let edges = Self::backtrack(graph, &table, source, target, level, k)?;
        let mut result = graph.path_result(&edges)?;
        result.total_cost = cost;

        debug!(
            from,
            to,
            levels,
            legs = level,
            cost = result.total_cost,
            "constrained route found"
        );

        Ok(result)
    }

    /// Index-based walk from label `k` of `(level, target)` down to `(0, source)`.
    fn backtrack(
        graph: &FlightGraph,
        table: &LevelTable,
        source: usize,
        target: usize,
        level: usize,
        k: usize,
    ) -> Result<Vec<usize>, Error> {
        let mut edges = Vec::with_capacity(level);
        let mut city = target;
        let mut label_idx = k;

        for current in (1..=level).rev() {
            let (edge_idx, prev_idx) = table.labels[table.slot(current, city)]
                .get(label_idx)
                .and_then(|label| label.pred)
                .ok_or(Error::PathReconstructionFailed)?;
            edges.push(edge_idx);
            city = graph.get_edge_source_node(edge_idx)?;
            label_idx = prev_idx;
        }

        if city != source || table.labels[table.slot(0, city)].get(label_idx).is_none() {
            return Err(Error::PathReconstructionFailed);
        }

        edges.reverse();
        Ok(edges)
    }
}

#[cfg(test)]
mod dp_tests {
    use super::*;
    use crate::csr::GraphBuilder;
    use common::discount::{DiscountRule, Pricing};

    /// A -> B 100, B -> C 50, A -> C 200.
    fn triangle() -> FlightGraph {
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "IndiGo", 100.0, 60);
        builder.add_flight("B", "C", "SpiceJet", 50.0, 45);
        builder.add_flight("A", "C", "Air India", 200.0, 90);
        builder.build().unwrap()
    }

    #[test]
    fn one_stop_allowance_takes_direct_flight() {
        let result = ConstrainedSolver
            .solve(&triangle(), "A", "C", &Constraints::new(1))
            .unwrap();

        assert_eq!(result.cities, vec!["A", "C"]);
        assert_eq!(result.total_cost, 200.0);
        assert_eq!(result.stops, 0);
        assert_eq!(result.airlines, vec!["Air India"]);
    }

    #[test]
    fn two_stop_allowance_takes_connection() {
        let result = ConstrainedSolver
            .solve(&triangle(), "A", "C", &Constraints::new(2))
            .unwrap();

        assert_eq!(result.cities, vec!["A", "B", "C"]);
        assert_eq!(result.total_cost, 150.0);
        assert_eq!(result.total_duration, 105);
        assert_eq!(result.stops, 1);
    }

    #[test]
    fn zero_stops_admits_direct_flight_only() {
        let graph = triangle();

        let direct = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(0))
            .unwrap();
        assert_eq!(direct.cities, vec!["A", "C"]);

        // B -> A has no direct flight (and no route at all).
        let result = ConstrainedSolver.solve(&graph, "B", "A", &Constraints::new(0));
        assert!(matches!(result, Err(Error::Unreachable { .. })));
    }

    #[test]
    fn budget_rejects_only_route() {
        let result =
            ConstrainedSolver.solve(&triangle(), "A", "C", &Constraints::new(2).with_budget(100.0));

        assert!(matches!(result, Err(Error::Infeasible { .. })));
    }

    #[test]
    fn budget_between_routes_keeps_cheaper_one() {
        let result = ConstrainedSolver
            .solve(&triangle(), "A", "C", &Constraints::new(2).with_budget(150.0))
            .unwrap();

        assert_eq!(result.total_cost, 150.0);
    }

    #[test]
    fn zero_budget_admits_only_free_flights() {
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "IndiGo", 100.0, 60);
        builder
            .add_flight("A", "B", "Vistara", 100.0, 60)
            .discounts
            .push(DiscountRule::Cashback {
                amount: 100.0,
                airlines: Vec::new(),
            });
        let graph = builder.build().unwrap();

        let result = ConstrainedSolver
            .solve(&graph, "A", "B", &Constraints::new(1).with_budget(0.0))
            .unwrap();
        assert_eq!(result.airlines, vec!["Vistara"]);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn unreachable_differs_from_infeasible() {
        let graph = triangle();

        let result = ConstrainedSolver.solve(&graph, "C", "A", &Constraints::new(5));
        assert_eq!(
            result.unwrap_err(),
            Error::Unreachable {
                from: "C".to_string(),
                to: "A".to_string()
            }
        );
    }

    #[test]
    fn source_equal_to_destination_ignores_constraints() {
        let constraints = Constraints::new(0).with_budget(0.0).avoid_airline("IndiGo");
        let result = ConstrainedSolver
            .solve(&triangle(), "B", "B", &constraints)
            .unwrap();

        assert_eq!(result, PathResult::empty());
    }

    #[test]
    fn unknown_city_is_invalid_query() {
        let result = ConstrainedSolver.solve(&triangle(), "A", "Z", &Constraints::new(2));
        assert!(matches!(result, Err(Error::InvalidQuery(_))));

        let result = ConstrainedSolver.solve(&triangle(), "Z", "Z", &Constraints::new(2));
        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn negative_budget_is_invalid_query() {
        let result =
            ConstrainedSolver.solve(&triangle(), "A", "C", &Constraints::new(2).with_budget(-1.0));
        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }

    #[test]
    fn preference_penalty_can_flip_the_route() {
        // Unadjusted: A-B-C = 150 beats A-C = 200. Preferring Air India makes
        // the connection 150 * 1.15 = 172.5, still cheaper. With a 1.5 penalty
        // it becomes 225 and the direct Air India flight wins.
        let graph = triangle();

        let mild = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(2).prefer_airline("Air India"))
            .unwrap();
        assert_eq!(mild.cities, vec!["A", "B", "C"]);
        assert!((mild.total_cost - 172.5).abs() < 1e-9);

        let strong = ConstrainedSolver
            .solve(
                &graph,
                "A",
                "C",
                &Constraints::new(2).prefer_airline_with_penalty("Air India", 1.5),
            )
            .unwrap();
        assert_eq!(strong.cities, vec!["A", "C"]);
        assert_eq!(strong.total_cost, 200.0);
    }

    #[test]
    fn avoided_airline_is_never_boarded() {
        let result = ConstrainedSolver
            .solve(&triangle(), "A", "C", &Constraints::new(2).avoid_airline("SpiceJet"))
            .unwrap();

        assert_eq!(result.cities, vec!["A", "C"]);
    }

    #[test]
    fn max_duration_prunes_slow_routes() {
        let result = ConstrainedSolver
            .solve(&triangle(), "A", "C", &Constraints::new(2).with_max_duration(100))
            .unwrap();
        assert_eq!(result.cities, vec!["A", "C"]);

        let result =
            ConstrainedSolver.solve(&triangle(), "A", "C", &Constraints::new(2).with_max_duration(30));
        assert!(matches!(result, Err(Error::Infeasible { .. })));
    }

    #[test]
    fn faster_pricier_prefix_survives_duration_limit() {
        // X reaches B cheaply but slowly; Y reaches B fast. Only A-Y-B-X-C fits 80 minutes.
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "X", 10.0, 50);
        builder.add_flight("A", "B", "Y", 50.0, 10);
        builder.add_flight("B", "C", "X", 10.0, 40);
        let graph = builder.build().unwrap();

        let limited = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(2).with_max_duration(80))
            .unwrap();
        assert_eq!(limited.airlines, vec!["Y", "X"]);
        assert_eq!(limited.total_cost, 60.0);
        assert_eq!(limited.total_duration, 50);

        let unlimited = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(2))
            .unwrap();
        assert_eq!(unlimited.airlines, vec!["X", "X"]);
        assert_eq!(unlimited.total_cost, 20.0);
    }

    #[test]
    fn duration_limit_keeps_cheapest_of_fitting_routes() {
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "X", 10.0, 50);
        builder.add_flight("A", "B", "Y", 50.0, 10);
        builder.add_flight("A", "B", "Z", 30.0, 20);
        builder.add_flight("B", "C", "X", 10.0, 40);
        let graph = builder.build().unwrap();

        let result = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(2).with_max_duration(60))
            .unwrap();
        assert_eq!(result.airlines, vec!["Z", "X"]);
        assert_eq!(result.total_cost, 40.0);
    }

    #[test]
    fn negative_cycle_route_may_revisit_cities() {
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "IndiGo", 100.0, 60);
        builder.add_flight("B", "C", "IndiGo", 100.0, 60);
        builder
            .add_flight("C", "B", "IndiGo", 50.0, 60)
            .discounts
            .push(DiscountRule::Cashback {
                amount: 200.0,
                airlines: Vec::new(),
            });
        builder.city("D");
        builder.city("E");
        let graph = builder.build().unwrap();

        let result = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(4))
            .unwrap();
        assert_eq!(result.cities, vec!["A", "B", "C", "B", "C"]);
        assert_eq!(result.total_cost, 150.0);
    }

    #[test]
    fn equal_cost_prefers_fewer_stops() {
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "IndiGo", 100.0, 60);
        builder.add_flight("B", "C", "IndiGo", 100.0, 60);
        builder.add_flight("A", "C", "IndiGo", 200.0, 60);
        let graph = builder.build().unwrap();

        let result = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(3))
            .unwrap();
        assert_eq!(result.cities, vec!["A", "C"]);
        assert_eq!(result.stops, 0);
    }

    #[test]
    fn equal_cost_and_stops_keeps_first_discovered() {
        let mut builder = GraphBuilder::new(Pricing::default());
        builder.add_flight("A", "B", "IndiGo", 50.0, 60);
        builder.add_flight("A", "D", "IndiGo", 50.0, 60);
        builder.add_flight("B", "C", "IndiGo", 50.0, 60);
        builder.add_flight("D", "C", "IndiGo", 50.0, 60);
        let graph = builder.build().unwrap();

        let result = ConstrainedSolver
            .solve(&graph, "A", "C", &Constraints::new(2))
            .unwrap();
        assert_eq!(result.cities, vec!["A", "B", "C"]);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let graph = triangle();
        let constraints = Constraints::new(2).with_budget(500.0);

        let first = ConstrainedSolver.solve(&graph, "A", "C", &constraints);
        let second = ConstrainedSolver.solve(&graph, "A", "C", &constraints);
        assert_eq!(first, second);
    }
}
