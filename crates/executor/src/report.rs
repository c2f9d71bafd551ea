use std::time::Duration;

use super::discounts::DiscountSummary;
use super::harness::{Algorithm, ComparisonReport, Difference, GroupSummary, RouteEntry};

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

pub fn print_discount_summary(summary: &DiscountSummary) {
    println!("\nDISCOUNTS");
    println!(
        "  {} of {} flights discounted, total savings Rs.{:.2}, average Rs.{:.2}",
        summary.discounted_flights,
        summary.total_flights,
        summary.total_savings,
        summary.average_saving()
    );
    if summary.negative_weight_flights > 0 {
        println!(
            "  {} flights have a negative effective fare",
            summary.negative_weight_flights
        );
    }
}

/// Runtime per query, then the route each algorithm chose.
pub fn print_comparison(report: &ComparisonReport) {
    println!("\n1. RUNTIME COMPARISON\n");
    for comparison in &report.comparisons {
        let timings: Vec<String> = comparison
            .runs
            .iter()
            .map(|run| format!("{}: {:.3}ms", run.algorithm.label(), millis(run.elapsed)))
            .collect();
        println!("{}: {}", comparison.query.label(), timings.join(" | "));
    }

    println!("\n2. PATH & COST DIFFERENCES\n");
    for comparison in &report.comparisons {
        let differences = comparison.differences();
        let label = comparison.query.label();

        if differences.is_empty() {
            match comparison.runs.first().map(|run| &run.outcome) {
                Some(Ok(path)) => println!(
                    "{}: All algorithms found {} at Rs.{:.2}",
                    label,
                    path.route_label(),
                    path.total_cost
                ),
                Some(Err(e)) => println!("{}: All algorithms failed: {}", label, e),
                None => println!("{}: No runs", label),
            }
            continue;
        }

        println!("{}:", label);
        for run in &comparison.runs {
            match &run.outcome {
                Ok(path) => println!(
                    "  {:<20} Path: {}, Cost: Rs.{:.2}, Stops: {}",
                    run.algorithm.label(),
                    path.route_label(),
                    path.total_cost,
                    path.stops
                ),
                Err(e) => println!("  {:<20} {}", run.algorithm.label(), e),
            }
        }
        for difference in differences {
            match difference {
                Difference::Cost {
                    algorithm: Algorithm::DynamicProgramming,
                    ..
                } => println!("  Note: DP cost differs due to query constraints"),
                Difference::Cost {
                    algorithm,
                    cost,
                    reference,
                } => println!(
                    "  Note: {} cost Rs.{:.2} differs from Rs.{:.2}",
                    algorithm.label(),
                    cost,
                    reference
                ),
                Difference::Path {
                    algorithm, route, ..
                } => println!(
                    "  Note: {} chose {} at equal cost",
                    algorithm.label(),
                    route
                ),
                Difference::Outcome {
                    algorithm,
                    succeeded,
                } => println!(
                    "  Note: {} {}",
                    algorithm.label(),
                    if succeeded {
                        "found a route where Bellman-Ford did not"
                    } else {
                        "found no route where Bellman-Ford did"
                    }
                ),
            }
        }
    }

    if report.negative_weights {
        println!("\nNote: the graph has negative effective fares; Dijkstra results are unreliable.");
    }
}

pub fn print_group_summaries(title: &str, summaries: &[GroupSummary]) {
    println!("\n3. {}\n", title);
    for summary in summaries {
        let timings: Vec<String> = summary
            .average
            .iter()
            .map(|(algorithm, average)| format!("{}: {:.3}ms", algorithm.label(), millis(*average)))
            .collect();
        println!(
            "{} ({} queries, {} failed runs): {}",
            summary.name,
            summary.queries,
            summary.failed_runs,
            timings.join(" | ")
        );
    }
}

pub fn print_all_routes(from: &str, entries: &[RouteEntry]) {
    println!("\nALL ROUTES FROM {}\n", from);
    for entry in entries {
        match &entry.route {
            Some(path) => println!(
                "  {:<5} Rs.{:>10.2}  {} stop(s)  {}",
                entry.destination,
                path.total_cost,
                path.stops,
                path.route_label()
            ),
            None => println!("  {:<5} unreachable", entry.destination),
        }
    }
}
