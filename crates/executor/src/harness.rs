use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use common::error::Error as RouteError;
use common::types::PathResult;
use flight_router_core::{
    BellmanFordSolver, ConstrainedSolver, DijkstraSolver, FlightGraph, ShortestPathSolver,
};

use super::types::RouteQuery;

/// Costs closer than this are treated as equal when comparing algorithms.
pub const COST_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    BellmanFord,
    Dijkstra,
    DynamicProgramming,
}

impl Algorithm {
    /// Execution order. Bellman-Ford runs first so a negative cycle is
    /// reported before any constrained search result.
    pub const ALL: [Algorithm; 3] = [
        Algorithm::BellmanFord,
        Algorithm::Dijkstra,
        Algorithm::DynamicProgramming,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::BellmanFord => BellmanFordSolver.name(),
            Algorithm::Dijkstra => DijkstraSolver.name(),
            Algorithm::DynamicProgramming => ConstrainedSolver.name(),
        }
    }
}

/// One solver invocation: its outcome and wall-clock time.
#[derive(Debug, Clone)]
pub struct AlgorithmRun {
    pub algorithm: Algorithm,
    pub outcome: Result<PathResult, RouteError>,
    pub elapsed: Duration,
}

impl AlgorithmRun {
    pub fn cost(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|path| path.total_cost)
    }
}

/// Why the algorithms' answers to one query differ.
#[derive(Debug, Clone, PartialEq)]
pub enum Difference {
    Cost {
        algorithm: Algorithm,
        cost: f64,
        reference: f64,
    },
    Path {
        algorithm: Algorithm,
        route: String,
        reference: String,
    },
    Outcome {
        algorithm: Algorithm,
        succeeded: bool,
    },
}

/// All runs for a single query.
#[derive(Debug, Clone)]
pub struct QueryComparison {
    pub query: RouteQuery,
    pub runs: Vec<AlgorithmRun>,
}

impl QueryComparison {
    pub fn run(&self, algorithm: Algorithm) -> Option<&AlgorithmRun> {
        self.runs.iter().find(|run| run.algorithm == algorithm)
    }

    /// Differences of every run against the Bellman-Ford run.
    ///
    /// The constrained search answers a different question when the query
    /// carries constraints, so a cost gap there is expected and still listed.
    pub fn differences(&self) -> Vec<Difference> {
        let Some(reference) = self.run(Algorithm::BellmanFord) else {
            return Vec::new();
        };

        let mut differences = Vec::new();
        for run in self.runs.iter().filter(|run| run.algorithm != reference.algorithm) {
            match (&run.outcome, &reference.outcome) {
                (Ok(path), Ok(expected)) => {
                    if (path.total_cost - expected.total_cost).abs() > COST_TOLERANCE {
                        differences.push(Difference::Cost {
                            algorithm: run.algorithm,
                            cost: path.total_cost,
                            reference: expected.total_cost,
                        });
                    } else if path.cities != expected.cities {
                        differences.push(Difference::Path {
                            algorithm: run.algorithm,
                            route: path.route_label(),
                            reference: expected.route_label(),
                        });
                    }
                }
                (Err(_), Err(_)) => {}
                (outcome, _) => differences.push(Difference::Outcome {
                    algorithm: run.algorithm,
                    succeeded: outcome.is_ok(),
                }),
            }
        }

        differences
    }

    pub fn agrees(&self) -> bool {
        self.differences().is_empty()
    }
}

/// Everything one harness pass produced.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub comparisons: Vec<QueryComparison>,
    /// Set when some flight has a negative effective weight, which makes
    /// Dijkstra's answers unreliable.
    pub negative_weights: bool,
}

impl ComparisonReport {
    pub fn total_time(&self, algorithm: Algorithm) -> Duration {
        self.comparisons
            .iter()
            .filter_map(|comparison| comparison.run(algorithm))
            .map(|run| run.elapsed)
            .sum()
    }

    pub fn average_time(&self, algorithm: Algorithm) -> Option<Duration> {
        let runs = u32::try_from(self.comparisons.len()).ok()?;
        (runs > 0).then(|| self.total_time(algorithm) / runs)
    }

    pub fn failed_runs(&self) -> usize {
        self.comparisons
            .iter()
            .flat_map(|comparison| &comparison.runs)
            .filter(|run| run.outcome.is_err())
            .count()
    }

    pub fn disagreements(&self) -> impl Iterator<Item = &QueryComparison> {
        self.comparisons.iter().filter(|comparison| !comparison.agrees())
    }

    pub fn summarize(&self, name: impl Into<String>) -> GroupSummary {
        GroupSummary {
            name: name.into(),
            queries: self.comparisons.len(),
            average: Algorithm::ALL
                .iter()
                .map(|&algorithm| (algorithm, self.average_time(algorithm).unwrap_or_default()))
                .collect(),
            failed_runs: self.failed_runs(),
        }
    }
}

/// Averaged timings for one named group of queries.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub name: String,
    pub queries: usize,
    pub average: Vec<(Algorithm, Duration)>,
    pub failed_runs: usize,
}

/// One row of the all-routes table.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub destination: String,
    pub route: Option<PathResult>,
}

/// Runs every algorithm over the same queries on one graph.
pub struct ComparisonHarness<'g> {
    graph: &'g FlightGraph,
    negative_weights: bool,
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

impl<'g> ComparisonHarness<'g> {
    pub fn new(graph: &'g FlightGraph) -> Self {
        let negative_weights = graph.has_negative_weights();
        if negative_weights {
            warn!("graph has negative effective weights; Dijkstra results are unreliable");
        }

        ComparisonHarness {
            graph,
            negative_weights,
        }
    }

    fn execute(&self, algorithm: Algorithm, query: &RouteQuery) -> AlgorithmRun {
        let (outcome, elapsed) = timed(|| match algorithm {
            Algorithm::BellmanFord => BellmanFordSolver.find_route(self.graph, &query.from, &query.to),
            Algorithm::Dijkstra => DijkstraSolver.find_route(self.graph, &query.from, &query.to),
            Algorithm::DynamicProgramming => {
                ConstrainedSolver.solve(self.graph, &query.from, &query.to, &query.constraints)
            }
        });

        match &outcome {
            Ok(path) => debug!(
                query = %query.label(),
                algorithm = algorithm.label(),
                cost = path.total_cost,
                stops = path.stops,
                elapsed_us = micros(elapsed),
                "query solved"
            ),
            Err(e) if e.is_no_route() => info!(
                query = %query.label(),
                algorithm = algorithm.label(),
                reason = %e,
                "no route"
            ),
            Err(e) => warn!(
                query = %query.label(),
                algorithm = algorithm.label(),
                error = %e,
                "query failed"
            ),
        }

        AlgorithmRun {
            algorithm,
            outcome,
            elapsed,
        }
    }

    pub fn compare(&self, query: &RouteQuery) -> QueryComparison {
        QueryComparison {
            query: query.clone(),
            runs: Algorithm::ALL
                .iter()
                .map(|&algorithm| self.execute(algorithm, query))
                .collect(),
        }
    }

    pub fn run_all(&self, queries: &[RouteQuery]) -> ComparisonReport {
        let comparisons: Vec<_> = queries.iter().map(|query| self.compare(query)).collect();
        let report = ComparisonReport {
            comparisons,
            negative_weights: self.negative_weights,
        };

        info!(
            queries = report.comparisons.len(),
            failed_runs = report.failed_runs(),
            disagreements = report.disagreements().count(),
            "comparison finished"
        );

        report
    }

    /// Cheapest route from `from` to every other city, cheapest first and
    /// unreachable cities last.
    ///
    /// # Errors
    /// `InvalidQuery` for an unknown city and `NegativeCycle` when one is
    /// reachable from `from`.
    pub fn all_routes_from(&self, from: &str) -> Result<Vec<RouteEntry>, RouteError> {
        let source = self.graph.city_id(from)?;
        let tree = BellmanFordSolver.shortest_paths(self.graph, source)?;

        let mut entries = Vec::with_capacity(self.graph.num_nodes.saturating_sub(1));
        for city in (0..self.graph.num_nodes).filter(|&city| city != source) {
            let route = match tree.path_to(self.graph, city) {
                Ok(path) => Some(path),
                Err(RouteError::Unreachable { .. }) => None,
                Err(e) => return Err(e),
            };
            entries.push(RouteEntry {
                destination: self.graph.city_code(city).to_string(),
                route,
            });
        }

        entries.sort_by(|a, b| {
            let cost = |entry: &RouteEntry| {
                entry
                    .route
                    .as_ref()
                    .map_or(f64::INFINITY, |path| path.total_cost)
            };
            cost(a).total_cmp(&cost(b))
        });

        Ok(entries)
    }
}
