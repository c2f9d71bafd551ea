use std::collections::{HashMap, VecDeque};
use std::ops::Range;

use common::discount::Pricing;
use common::error::Error;
use common::types::{City, CityId, Flight, PathResult};

/// Flight network in Compressed Sparse Row (CSR) format.
///
/// CSR format stores outgoing flights of each city contiguously in memory:
/// - `node_pointers[u]..node_pointers[u+1]` → flights departing city `u`
/// - `edge_targets[i]` -> destination city of flight `i`
/// - `edge_weights[i]` -> effective weight (fare after discounts) of flight `i`
/// - `edge_source_by_index[i]` -> departure city of flight `i`
/// - `flights[i]` -> the full flight record behind edge `i`
///
/// Flights are sorted by departure city with a stable sort, so flights from
/// the same city keep the order they were supplied in. Every solver walks
/// edges in this order, which makes relaxation order and tie-breaking
/// reproducible. The graph is never mutated after construction.
#[derive(Debug, Clone)]
pub struct FlightGraph {
    pub num_nodes: usize,
    pub cities: Vec<City>,
    pub node_pointers: Vec<usize>,
    pub edge_targets: Vec<usize>,
    pub edge_weights: Vec<f64>,
    pub edge_source_by_index: Vec<usize>,
    pub flights: Vec<Flight>,
    city_index: HashMap<String, CityId>,
}

impl FlightGraph {
    /// Creates a new CSR graph from a city list and the flights between them.
    ///
    /// Each edge weight is the flight's effective weight under `pricing`; it
    /// may be negative when discounts exceed the fare.
    ///
    /// # Errors
    /// - `Error::InvalidGraph` for duplicate city codes, a negative or
    ///   non-finite base fare, or a non-finite effective weight.
    /// - `Error::NodeIndexOutOfBounds` when a flight references a city index
    ///   outside `cities`.
    pub fn from_flights(
        cities: Vec<City>,
        mut flights: Vec<Flight>,
        pricing: &Pricing,
    ) -> Result<Self, Error> {
        let num_nodes = cities.len();

        let mut city_index = HashMap::with_capacity(num_nodes);
        for (id, city) in cities.iter().enumerate() {
            if city_index.insert(city.code.clone(), id).is_some() {
                return Err(Error::InvalidGraph(format!(
                    "duplicate city code {}",
                    city.code
                )));
            }
        }

        for flight in &flights {
            Self::validate_flight(num_nodes, flight)?;
        }

        flights.sort_by_key(|flight| flight.from);

        let (node_pointers, edge_targets, edge_weights, edge_source_by_index) =
            Self::build_csr_from_flights(num_nodes, &flights, pricing);

        if let Some(i) = edge_weights.iter().position(|w| !w.is_finite()) {
            return Err(Error::InvalidGraph(format!(
                "flight {} -> {} has a non-finite effective weight",
                cities[flights[i].from].code, cities[flights[i].to].code
            )));
        }

        Ok(Self {
            num_nodes,
            cities,
            node_pointers,
            edge_targets,
            edge_weights,
            edge_source_by_index,
            flights,
            city_index,
        })
    }

    fn validate_flight(num_nodes: usize, flight: &Flight) -> Result<(), Error> {
        for city in [flight.from, flight.to] {
            if city >= num_nodes {
                return Err(Error::NodeIndexOutOfBounds(city));
            }
        }

        if !flight.base_fare.is_finite() || flight.base_fare < 0.0 {
            return Err(Error::InvalidGraph(format!(
                "flight {} -> {} on {} has invalid base fare {}",
                flight.from, flight.to, flight.airline, flight.base_fare
            )));
        }

        Ok(())
    }

    /// Internal helper to construct all necessary arrays for the CSR format.
    ///
    /// Uses the two-pass counting technique to build the CSR index and prices
    /// every flight once, so solvers only ever read plain `f64` weights.
    ///
    /// # Returns
    /// 1. `node_pointers`: starting index of each city's outgoing flights (size |V| + 1).
    /// 2. `edge_targets`: destination city of each flight.
    /// 3. `edge_weights`: effective weight of each flight.
    /// 4. `edge_source_by_index`: departure city of each flight, giving O(1)
    ///    reverse lookups during route and cycle reconstruction.
    fn build_csr_from_flights(
        num_nodes: usize,
        flights: &[Flight],
        pricing: &Pricing,
    ) -> (Vec<usize>, Vec<usize>, Vec<f64>, Vec<usize>) {
        let m = flights.len();
        let mut node_pointers = vec![0; num_nodes + 1];

        for flight in flights {
            node_pointers[flight.from + 1] += 1;
        }

        for i in 1..=num_nodes {
            node_pointers[i] += node_pointers[i - 1];
        }

        let mut edge_targets = vec![0; m];
        let mut edge_weights = vec![0.0; m];
        let mut edge_source_by_index = vec![0; m];

        let mut cursor = node_pointers.clone();

        for flight in flights {
            let u = flight.from;
            let pos = cursor[u]; // Get the next available position for city 'u'
            edge_weights[pos] = pricing.effective_weight(flight);
            edge_targets[pos] = flight.to;
            edge_source_by_index[pos] = u;

            cursor[u] += 1;
        }

        (
            node_pointers,
            edge_targets,
            edge_weights,
            edge_source_by_index,
        )
    }

    /// O(1) lookup for the source city of a given edge index.
    ///
    /// # Errors
    /// Returns `Error::InvalidGraph` if `edge_idx` is out of bounds.
    pub fn get_edge_source_node(&self, edge_idx: usize) -> Result<usize, Error> {
        self.edge_source_by_index
            .get(edge_idx)
            .copied()
            .ok_or_else(|| Error::InvalidGraph(format!("edge index {} out of bounds", edge_idx)))
    }

    /// CSR index range of the flights departing `city`.
    pub fn edges_from(&self, city: CityId) -> Range<usize> {
        self.node_pointers[city]..self.node_pointers[city + 1]
    }

    pub fn num_edges(&self) -> usize {
        self.edge_targets.len()
    }

    pub fn flight(&self, edge_idx: usize) -> &Flight {
        &self.flights[edge_idx]
    }

    /// Resolves a city code, rejecting codes the graph does not know.
    pub fn city_id(&self, code: &str) -> Result<CityId, Error> {
        self.city_index
            .get(code)
            .copied()
            .ok_or_else(|| Error::InvalidQuery(format!("city '{}' not found in graph", code)))
    }

    pub fn city_code(&self, city: CityId) -> &str {
        &self.cities[city].code
    }

    /// True when at least one flight is priced below zero, in which case
    /// Dijkstra results are not trustworthy.
    pub fn has_negative_weights(&self) -> bool {
        self.edge_weights.iter().any(|&w| w < 0.0)
    }

    /// Cities reachable from `source` by any sequence of flights, ignoring
    /// prices and constraints.
    pub fn reachable_from(&self, source: CityId) -> Vec<bool> {
        let mut seen = vec![false; self.num_nodes];
        let mut queue = VecDeque::with_capacity(self.num_nodes);

        seen[source] = true;
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for i in self.edges_from(u) {
                let v = self.edge_targets[i];
                if !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }

        seen
    }

    /// Builds a `PathResult` from consecutive edge indices, source first.
    ///
    /// The cost is the plain sum of effective weights in travel order.
    ///
    /// # Errors
    /// `Error::PathReconstructionFailed` if the edges do not chain.
    pub fn path_result(&self, edges: &[usize]) -> Result<PathResult, Error> {
        let Some(&first) = edges.first() else {
            return Ok(PathResult::empty());
        };

        let mut cities = Vec::with_capacity(edges.len() + 1);
        let mut airlines = Vec::with_capacity(edges.len());
        let mut total_cost = 0.0;
        let mut total_duration: u32 = 0;

        let mut current = self.get_edge_source_node(first)?;
        cities.push(self.city_code(current).to_string());

        for &edge_idx in edges {
            if self.get_edge_source_node(edge_idx)? != current {
                return Err(Error::PathReconstructionFailed);
            }

            let flight = self.flight(edge_idx);
            current = self.edge_targets[edge_idx];

            cities.push(self.city_code(current).to_string());
            airlines.push(flight.airline.clone());
            total_cost += self.edge_weights[edge_idx];
            total_duration = total_duration.saturating_add(flight.duration_minutes);
        }

        Ok(PathResult {
            cities,
            total_cost,
            total_duration,
            stops: edges.len() - 1,
            airlines,
        })
    }
}

/// Incremental construction of a `FlightGraph` from city codes.
///
/// Cities are interned in first-seen order; flights keep insertion order
/// within each departure city.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    pricing: Pricing,
    cities: Vec<City>,
    city_index: HashMap<String, CityId>,
    flights: Vec<Flight>,
    cheapest_per_pair: bool,
}

impl GraphBuilder {
    pub fn new(pricing: Pricing) -> Self {
        GraphBuilder {
            pricing,
            ..Default::default()
        }
    }

    /// Collapse parallel flights so only the cheapest per (from, to) pair remains.
    pub fn keep_cheapest_per_pair(mut self, enabled: bool) -> Self {
        self.cheapest_per_pair = enabled;
        self
    }

    /// Registers a city, filling in its display name if it was already known without one.
    pub fn add_city(&mut self, city: City) -> CityId {
        if let Some(&id) = self.city_index.get(&city.code) {
            if self.cities[id].name.is_none() {
                self.cities[id].name = city.name;
            }
            return id;
        }

        let id = self.cities.len();
        self.city_index.insert(city.code.clone(), id);
        self.cities.push(city);
        id
    }

    pub fn city(&mut self, code: &str) -> CityId {
        self.add_city(City::new(code))
    }

    /// Adds a flight between two city codes and returns it for further
    /// decoration (discounts, travel month).
    pub fn add_flight(
        &mut self,
        from: &str,
        to: &str,
        airline: &str,
        base_fare: f64,
        duration_minutes: u32,
    ) -> &mut Flight {
        let from = self.city(from);
        let to = self.city(to);
        self.flights
            .push(Flight::new(from, to, airline, base_fare, duration_minutes));
        let last = self.flights.len() - 1;
        &mut self.flights[last]
    }

    pub fn num_flights(&self) -> usize {
        self.flights.len()
    }

    pub fn build(self) -> Result<FlightGraph, Error> {
        let flights = if self.cheapest_per_pair {
            Self::dedupe_city_pairs(self.flights, &self.pricing)
        } else {
            self.flights
        };

        FlightGraph::from_flights(self.cities, flights, &self.pricing)
    }

    /// Sort by (from, to, weight) and keep the first flight of each pair.
    /// The sort is stable, so equally priced flights keep insertion order.
    fn dedupe_city_pairs(mut flights: Vec<Flight>, pricing: &Pricing) -> Vec<Flight> {
        flights.sort_by(|a, b| {
            (a.from, a.to)
                .cmp(&(b.from, b.to))
                .then_with(|| pricing.effective_weight(a).total_cmp(&pricing.effective_weight(b)))
        });
        flights.dedup_by_key(|flight| (flight.from, flight.to));
        flights
    }
}
