pub mod config;
pub mod csv_loader;
pub mod discounts;
pub mod error;
pub mod harness;
pub mod report;
pub mod simulator;
pub mod types;

use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{Config, LoggingConfig};
use csv_loader::{CsvLoader, build_graph};
use discounts::DiscountSummary;
use error::Error;
use harness::ComparisonHarness;
use simulator::NetworkSimulator;
use types::{DataSource, RouteQuery};

fn main() {
    let (source, config_path) = parse_args();
    let config = config::load_config(config_path.as_deref()).expect("Failed to load config");
    init_tracing(&config.logging);

    let result = match source {
        DataSource::CSV(path) => run_dataset(&config, path),
        DataSource::SIM => run_simulation(&config),
    };

    if let Err(e) = result {
        eprintln!("route_compare failed: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Parse command-line arguments: `[csv [path] | sim] [--config <file>]`.
fn parse_args() -> (DataSource, Option<PathBuf>) {
    let args: Vec<String> = env::args().collect();
    let mut positional = Vec::new();
    let mut config_path = None;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if arg == "--config" {
            match rest.next() {
                Some(path) => config_path = Some(PathBuf::from(path)),
                None => usage(&args[0]),
            }
        } else {
            positional.push(arg.clone());
        }
    }

    let mode = positional
        .first()
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());

    let source = match mode.as_str() {
        "sim" => DataSource::SIM,
        "csv" => DataSource::CSV(positional.get(1).map(PathBuf::from)),
        _ => usage(&args[0]),
    };

    (source, config_path)
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} [CSV [path_to_csv] | SIM] [--config <file>]\n  - CSV: compare algorithms on flight records (default)\n  - SIM: compare runtime on synthetic networks",
        program
    );
    std::process::exit(1);
}

fn configured_queries(config: &Config) -> Vec<RouteQuery> {
    config
        .queries
        .iter()
        .filter_map(|entry| match entry.to_query() {
            Ok(query) => Some(query),
            Err(e) => {
                warn!(from = %entry.from, to = %entry.to, error = %e, "skipping invalid query");
                None
            }
        })
        .collect()
}

fn run_dataset(config: &Config, path: Option<PathBuf>) -> Result<(), Error> {
    let path = path.unwrap_or_else(|| config.data.flights_csv.clone());
    let loaded = CsvLoader::new(&path).load()?;

    let pricing = config.pricing.pricing();
    let graph = build_graph(
        &loaded.rows,
        &config.pricing.discounts,
        pricing.clone(),
        config.data.dedupe_city_pairs,
    )?;

    println!("\nFLIGHT ROUTE OPTIMIZATION: ALGORITHM COMPARISON");
    println!(
        "{} cities, {} flights ({} records skipped)",
        graph.num_nodes,
        graph.num_edges(),
        loaded.skipped
    );
    report::print_discount_summary(&DiscountSummary::from_graph(&graph, &pricing));

    let harness = ComparisonHarness::new(&graph);
    let report = harness.run_all(&configured_queries(config));
    report::print_comparison(&report);

    let summaries: Vec<_> = config
        .groups
        .iter()
        .map(|group| harness.run_all(&group.queries()).summarize(group.name.clone()))
        .collect();
    if !summaries.is_empty() {
        report::print_group_summaries("SCALABILITY ANALYSIS", &summaries);
    }

    if let Some(from) = &config.data.all_routes_from {
        match harness.all_routes_from(from) {
            Ok(entries) => report::print_all_routes(from, &entries),
            Err(e) => warn!(from = %from, error = %e, "all-routes analysis failed"),
        }
    }

    Ok(())
}

fn run_simulation(config: &Config) -> Result<(), Error> {
    let simulator = NetworkSimulator::new(config.simulator.clone());
    let pricing = config.pricing.pricing();

    let mut summaries = Vec::with_capacity(config.simulator.sizes.len());
    for &size in &config.simulator.sizes {
        let graph = simulator.generate(size, pricing.clone())?;
        let queries = simulator.sample_queries(&graph);
        info!(
            cities = size,
            flights = graph.num_edges(),
            queries = queries.len(),
            "running synthetic network"
        );

        let report = ComparisonHarness::new(&graph).run_all(&queries);
        summaries.push(report.summarize(format!("{} cities", size)));
    }

    report::print_group_summaries("SCALABILITY ANALYSIS (synthetic networks)", &summaries);
    Ok(())
}
