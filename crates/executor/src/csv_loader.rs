use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use common::discount::{DiscountRule, Pricing};
use common::types::City;
use flight_router_core::{FlightGraph, GraphBuilder};

use super::error::Error;

/// Airport codes and display names of the cities the dataset covers.
pub const CITY_CODES: [(&str, &str); 15] = [
    ("DEL", "Delhi"),
    ("BLR", "Bangalore"),
    ("BOM", "Mumbai"),
    ("CCU", "Kolkata"),
    ("MAA", "Chennai"),
    ("COK", "Cochin"),
    ("HYD", "Hyderabad"),
    ("PNQ", "Pune"),
    ("LKO", "Lucknow"),
    ("AMD", "Ahmedabad"),
    ("NAG", "Nagpur"),
    ("IDR", "Indore"),
    ("IXR", "Ranchi"),
    ("BBI", "Bhubaneswar"),
    ("GAU", "Guwahati"),
];

/// Spellings seen in raw booking data.
const CITY_ALIASES: [(&str, &str); 4] = [
    ("Banglore", "Bangalore"),
    ("Bengaluru", "Bangalore"),
    ("New Delhi", "Delhi"),
    ("Kochi", "Cochin"),
];

// Helper struct for CSV parsing
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub source: String,
    pub destination: String,
    pub airline: String,
    /// Kept as text: fares are often written with thousands separators ("3,897").
    pub base_fare: String,
    /// Either plain minutes ("170") or hours and minutes ("2h 50m").
    #[serde(alias = "duration_minutes")]
    pub duration: String,
    #[serde(default)]
    pub travel_month: Option<u8>,
}

/// A validated flight record with normalised city codes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRow {
    pub from: String,
    pub to: String,
    pub airline: String,
    pub base_fare: f64,
    pub duration_minutes: u32,
    pub travel_month: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFlights {
    pub rows: Vec<FlightRow>,
    pub skipped: usize,
}

/// Maps a city name, known misspelling or airport code to the airport code.
///
/// Unknown names fall back to their first three letters, upper-cased.
pub fn normalize_city(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let name = CITY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map_or(trimmed, |&(_, canonical)| canonical);

    let known = CITY_CODES.iter().find(|(code, city)| {
        code.eq_ignore_ascii_case(name) || city.eq_ignore_ascii_case(name)
    });

    match known {
        Some((code, _)) => Some(code.to_string()),
        None => Some(name.chars().take(3).collect::<String>().to_uppercase()),
    }
}

/// Display name for a known airport code.
pub fn city_name(code: &str) -> Option<&'static str> {
    CITY_CODES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|&(_, name)| name)
}

/// Parses "3,897" or "3897.50"; only strictly positive fares are accepted.
pub fn parse_fare(raw: &str) -> Option<f64> {
    let fare: f64 = raw.trim().replace(',', "").parse().ok()?;
    (fare.is_finite() && fare > 0.0).then_some(fare)
}

/// Parses "170", "2h 50m", "19h" or "45m" into minutes.
pub fn parse_duration(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(minutes) = trimmed.parse::<u32>() {
        return Some(minutes);
    }

    let mut total: u32 = 0;
    let mut matched = false;
    for part in trimmed.split_whitespace() {
        let (value, multiplier) = if let Some(hours) = part.strip_suffix('h') {
            (hours, 60)
        } else if let Some(minutes) = part.strip_suffix('m') {
            (minutes, 1)
        } else {
            return None;
        };
        let value: u32 = value.parse().ok()?;
        total = total.checked_add(value.checked_mul(multiplier)?)?;
        matched = true;
    }

    matched.then_some(total)
}

impl CsvRecord {
    /// Validates one record. Returns the reason on rejection.
    pub fn validate(&self) -> Result<FlightRow, String> {
        let from = normalize_city(&self.source).ok_or("missing source city")?;
        let to = normalize_city(&self.destination).ok_or("missing destination city")?;
        if from == to {
            return Err(format!("source and destination are both {}", from));
        }

        let airline = self.airline.trim();
        if airline.is_empty() {
            return Err("missing airline".to_string());
        }

        let base_fare = parse_fare(&self.base_fare)
            .ok_or_else(|| format!("invalid fare '{}'", self.base_fare))?;
        let duration_minutes = parse_duration(&self.duration)
            .ok_or_else(|| format!("invalid duration '{}'", self.duration))?;

        let travel_month = match self.travel_month {
            Some(month) if !(1..=12).contains(&month) => {
                return Err(format!("invalid travel month {}", month));
            }
            month => month,
        };

        Ok(FlightRow {
            from,
            to,
            airline: airline.to_string(),
            base_fare,
            duration_minutes,
            travel_month,
        })
    }
}

pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvLoader {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Reads every record, keeping valid rows and counting the rest.
    ///
    /// A malformed file (unreadable, wrong columns) is an error; a record
    /// that parses but fails validation is skipped with a warning.
    pub fn load(&self) -> Result<LoadedFlights, Error> {
        let file = File::open(&self.path).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to open flight data");
            Error::IoError(e)
        })?;

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut rows = Vec::new();
        let mut skipped = 0;

        for (line, result) in rdr.deserialize().enumerate() {
            let record: CsvRecord = result?;
            match record.validate() {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    skipped += 1;
                    // +2: header line, and lines are 1-based.
                    debug!(line = line + 2, %reason, "skipping flight record");
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, path = %self.path.display(), "skipped invalid flight records");
        }
        info!(rows = rows.len(), path = %self.path.display(), "loaded flight records");

        Ok(LoadedFlights { rows, skipped })
    }
}

/// Builds the flight graph, attaching `discounts` to every flight.
pub fn build_graph(
    rows: &[FlightRow],
    discounts: &[DiscountRule],
    pricing: Pricing,
    dedupe_city_pairs: bool,
) -> Result<FlightGraph, Error> {
    let mut builder = GraphBuilder::new(pricing).keep_cheapest_per_pair(dedupe_city_pairs);

    for row in rows {
        for code in [&row.from, &row.to] {
            match city_name(code) {
                Some(name) => builder.add_city(City::with_name(code.as_str(), name)),
                None => builder.city(code),
            };
        }

        let flight = builder.add_flight(
            &row.from,
            &row.to,
            &row.airline,
            row.base_fare,
            row.duration_minutes,
        );
        flight.travel_month = row.travel_month;
        flight.discounts.extend_from_slice(discounts);
    }

    let flights_read = builder.num_flights();
    let graph = builder.build()?;
    info!(
        cities = graph.num_nodes,
        flights = graph.num_edges(),
        collapsed = flights_read - graph.num_edges(),
        "flight graph built"
    );

    Ok(graph)
}
