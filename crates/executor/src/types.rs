use serde::Deserialize;
use std::path::PathBuf;

use common::error::Error as RouteError;
use common::types::{Constraints, DEFAULT_PREFERENCE_PENALTY};

/// Where the flight network comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Flight records from a CSV file; `None` uses the configured path.
    CSV(Option<PathBuf>),
    /// Seeded synthetic networks of the configured sizes.
    SIM,
}

/// A fully validated query, ready for the harness.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub from: String,
    pub to: String,
    pub constraints: Constraints,
}

impl RouteQuery {
    pub fn new(from: impl Into<String>, to: impl Into<String>, constraints: Constraints) -> Self {
        RouteQuery {
            from: from.into(),
            to: to.into(),
            constraints,
        }
    }

    pub fn label(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

/// A query as written in configuration.
///
/// `max_stops` is signed so that a negative value reaches validation instead
/// of failing deserialization with an opaque message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryConfig {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub max_stops: Option<i64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub preferred_airline: Option<String>,
    #[serde(default)]
    pub preference_penalty: Option<f64>,
    #[serde(default)]
    pub avoid_airlines: Vec<String>,
    #[serde(default)]
    pub max_duration: Option<u32>,
}

impl QueryConfig {
    pub fn route(from: &str, to: &str) -> Self {
        QueryConfig {
            from: from.to_string(),
            to: to.to_string(),
            max_stops: None,
            budget: None,
            preferred_airline: None,
            preference_penalty: None,
            avoid_airlines: Vec::new(),
            max_duration: None,
        }
    }

    pub fn to_query(&self) -> Result<RouteQuery, RouteError> {
        let mut constraints = match self.max_stops {
            None => Constraints::unconstrained(),
            Some(stops) if stops < 0 => {
                return Err(RouteError::InvalidQuery(format!(
                    "max_stops must not be negative, got {} for {} -> {}",
                    stops, self.from, self.to
                )));
            }
            Some(stops) => Constraints::new(usize::try_from(stops).unwrap_or(usize::MAX)),
        };

        if let Some(budget) = self.budget {
            constraints = constraints.with_budget(budget);
        }
        if let Some(airline) = &self.preferred_airline {
            let penalty = self.preference_penalty.unwrap_or(DEFAULT_PREFERENCE_PENALTY);
            constraints = constraints.prefer_airline_with_penalty(airline.clone(), penalty);
        }
        for airline in &self.avoid_airlines {
            constraints = constraints.avoid_airline(airline.clone());
        }
        if let Some(minutes) = self.max_duration {
            constraints = constraints.with_max_duration(minutes);
        }

        constraints.validate()?;
        Ok(RouteQuery::new(self.from.clone(), self.to.clone(), constraints))
    }
}

/// A named set of routes whose timings are averaged together.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryGroup {
    pub name: String,
    pub routes: Vec<(String, String)>,
}

impl QueryGroup {
    pub fn queries(&self) -> Vec<RouteQuery> {
        self.routes
            .iter()
            .map(|(from, to)| RouteQuery::new(from.clone(), to.clone(), Constraints::unconstrained()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_max_stops_is_invalid() {
        let entry = QueryConfig {
            max_stops: Some(-1),
            ..QueryConfig::route("BLR", "DEL")
        };

        assert!(matches!(entry.to_query(), Err(RouteError::InvalidQuery(_))));
    }

    #[test]
    fn missing_max_stops_is_unconstrained() {
        let query = QueryConfig::route("BLR", "DEL").to_query().unwrap();

        assert_eq!(query.constraints, Constraints::unconstrained());
        assert_eq!(query.label(), "BLR -> DEL");
    }

    #[test]
    fn preference_uses_default_penalty() {
        let entry = QueryConfig {
            max_stops: Some(2),
            preferred_airline: Some("IndiGo".to_string()),
            avoid_airlines: vec!["SpiceJet".to_string()],
            ..QueryConfig::route("BLR", "DEL")
        };
        let query = entry.to_query().unwrap();

        let preference = query.constraints.preferred_airline.as_ref().unwrap();
        assert_eq!(preference.airline, "IndiGo");
        assert_eq!(preference.penalty_factor, DEFAULT_PREFERENCE_PENALTY);
        assert_eq!(query.constraints.max_stops, 2);
        assert!(!query.constraints.allows("SpiceJet"));
    }

    #[test]
    fn negative_budget_fails_validation() {
        let entry = QueryConfig {
            budget: Some(-5.0),
            ..QueryConfig::route("BLR", "DEL")
        };

        assert!(matches!(entry.to_query(), Err(RouteError::InvalidQuery(_))));
    }

    #[test]
    fn group_routes_become_unconstrained_queries() {
        let group = QueryGroup {
            name: "Small".to_string(),
            routes: vec![("BLR".to_string(), "DEL".to_string())],
        };
        let queries = group.queries();

        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].from, "BLR");
        assert_eq!(queries[0].constraints, Constraints::unconstrained());
    }
}
