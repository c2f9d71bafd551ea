use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use common::discount::{DiscountRule, Pricing};
use common::types::Constraints;
use flight_router_core::{FlightGraph, GraphBuilder};

use super::config::SimulatorConfig;
use super::error::Error;
use super::types::RouteQuery;

const AIRLINES: [&str; 5] = ["IndiGo", "Air India", "SpiceJet", "Vistara", "Jet Airways"];

/// Generates seeded synthetic flight networks for runtime comparisons.
///
/// Every network contains a ring `S000 -> S001 -> ... -> S000`, so every
/// city can reach every other, plus `flights_per_city - 1` random extra
/// departures per city. The same seed and size always give the same network.
pub struct NetworkSimulator {
    config: SimulatorConfig,
}

impl NetworkSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        NetworkSimulator { config }
    }

    /// Independent streams per network size: 0 builds the network, 1 samples queries.
    fn rng_for(&self, num_cities: usize, stream: u64) -> SmallRng {
        SmallRng::seed_from_u64(self.config.seed ^ (num_cities as u64).rotate_left(32) ^ stream)
    }

    fn city_code(i: usize) -> String {
        format!("S{:03}", i)
    }

    pub fn generate(&self, num_cities: usize, pricing: Pricing) -> Result<FlightGraph, Error> {
        let mut rng = self.rng_for(num_cities, 0);
        let mut builder = GraphBuilder::new(pricing);

        let (fare_min, fare_max) = self.config.fare_range;
        let (duration_min, duration_max) = self.config.duration_range;
        if !(fare_min > 0.0 && fare_min < fare_max && fare_max.is_finite())
            || duration_min > duration_max
        {
            return Err(Error::ConfigLoadError(format!(
                "simulator ranges are empty: fares {:?}, durations {:?}",
                self.config.fare_range, self.config.duration_range
            )));
        }

        // NaN fails the containment check too.
        let negative_share = self.config.negative_fare_share;
        if !(0.0..=1.0).contains(&negative_share) {
            return Err(Error::ConfigLoadError(format!(
                "negative_fare_share must be within [0, 1], got {}",
                negative_share
            )));
        }

        for i in 0..num_cities {
            builder.city(&Self::city_code(i));
        }

        if num_cities < 2 {
            return Ok(builder.build()?);
        }

        for from in 0..num_cities {
            let mut targets = vec![(from + 1) % num_cities];
            for _ in 1..self.config.flights_per_city {
                let to = rng.random_range(0..num_cities);
                if to != from {
                    targets.push(to);
                }
            }

            for to in targets {
                let airline = AIRLINES[rng.random_range(0..AIRLINES.len())];
                let fare = rng.random_range(fare_min..fare_max).round();
                let duration = rng.random_range(duration_min..=duration_max);

                let flight = builder.add_flight(
                    &Self::city_code(from),
                    &Self::city_code(to),
                    airline,
                    fare,
                    duration,
                );

                if rng.random_bool(negative_share) {
                    let overshoot = rng.random_range(1.0..=fare_min.max(1.0));
                    flight.discounts.push(DiscountRule::Cashback {
                        amount: (fare + overshoot).round(),
                        airlines: Vec::new(),
                    });
                }
            }
        }

        let graph = builder.build()?;
        debug!(
            cities = graph.num_nodes,
            flights = graph.num_edges(),
            negative = graph.has_negative_weights(),
            "synthetic network generated"
        );

        Ok(graph)
    }

    /// Random distinct city pairs of `graph`, constrained by the configured stop limit.
    pub fn sample_queries(&self, graph: &FlightGraph) -> Vec<RouteQuery> {
        if graph.num_nodes < 2 {
            return Vec::new();
        }

        let mut rng = self.rng_for(graph.num_nodes, 1);

        let constraints = match self.config.max_stops {
            Some(stops) => Constraints::new(stops),
            None => Constraints::unconstrained(),
        };

        (0..self.config.queries_per_size)
            .map(|_| {
                let from = rng.random_range(0..graph.num_nodes);
                let offset = rng.random_range(1..graph.num_nodes);
                let to = (from + offset) % graph.num_nodes;

                RouteQuery::new(
                    graph.city_code(from),
                    graph.city_code(to),
                    constraints.clone(),
                )
            })
            .collect()
    }
}
