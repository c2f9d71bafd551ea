use super::discount::DiscountRule;
use super::error::Error;

/// Dense index of a city inside a built graph.
pub type CityId = usize;

/// Multiplier applied to flights that are not on the preferred airline.
pub const DEFAULT_PREFERENCE_PENALTY: f64 = 1.15;

/// A city (airport). Identified by its code; the display name is informational.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct City {
    pub code: String,
    pub name: Option<String>,
}

impl City {
    pub fn new(code: impl Into<String>) -> Self {
        City {
            code: code.into(),
            name: None,
        }
    }

    pub fn with_name(code: impl Into<String>, name: impl Into<String>) -> Self {
        City {
            code: code.into(),
            name: Some(name.into()),
        }
    }
}

/// A single directed flight between two cities.
///
/// Fields:
/// - `from`, `to`: city indices into the owning graph.
/// - `base_fare`: fare before discounts. Must be finite and non-negative.
/// - `duration_minutes`: block time of the flight.
/// - `airline`: operating airline, matched by discount rules and constraints.
/// - `travel_month`: month of travel (1-12) when known, used by seasonal rules.
/// - `discounts`: rules that may reduce the fare of this flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub from: CityId,
    pub to: CityId,
    pub base_fare: f64,
    pub duration_minutes: u32,
    pub airline: String,
    pub travel_month: Option<u8>,
    pub discounts: Vec<DiscountRule>,
}

impl Flight {
    pub fn new(
        from: CityId,
        to: CityId,
        airline: impl Into<String>,
        base_fare: f64,
        duration_minutes: u32,
    ) -> Self {
        Flight {
            from,
            to,
            base_fare,
            duration_minutes,
            airline: airline.into(),
            travel_month: None,
            discounts: Vec::new(),
        }
    }

    pub fn with_discount(mut self, rule: DiscountRule) -> Self {
        self.discounts.push(rule);
        self
    }

    pub fn with_travel_month(mut self, month: u8) -> Self {
        self.travel_month = Some(month);
        self
    }
}

/// A route produced by one solver call.
///
/// `cities` lists every city visited, source first. A query whose source and
/// destination coincide yields an empty route with zero cost.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub cities: Vec<String>,
    pub total_cost: f64,
    pub total_duration: u32,
    pub stops: usize,
    pub airlines: Vec<String>,
}

impl PathResult {
    /// The zero-length route returned when source equals destination.
    pub fn empty() -> Self {
        PathResult {
            cities: Vec::new(),
            total_cost: 0.0,
            total_duration: 0,
            stops: 0,
            airlines: Vec::new(),
        }
    }

    /// Number of flights boarded.
    pub fn legs(&self) -> usize {
        self.airlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Human readable `A -> B -> C` form, `-` for an empty route.
    pub fn route_label(&self) -> String {
        if self.cities.is_empty() {
            "-".to_string()
        } else {
            self.cities.join(" -> ")
        }
    }
}

/// Preferred airline for a constrained query.
///
/// Flights on other airlines have their cost grown by `penalty_factor - 1`
/// times its magnitude, so a factor of 1.15 makes them 15% more expensive.
#[derive(Debug, Clone, PartialEq)]
pub struct AirlinePreference {
    pub airline: String,
    pub penalty_factor: f64,
}

/// Per-query limits for the constrained search.
///
/// `max_stops` bounds the number of flights: a value of 0 or 1 admits only a
/// direct flight, and every further unit admits one more connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
    pub max_stops: usize,
    pub budget_ceiling: f64,
    pub preferred_airline: Option<AirlinePreference>,
    pub avoid_airlines: Vec<String>,
    pub max_duration: Option<u32>,
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints::unconstrained()
    }
}

impl Constraints {
    pub fn new(max_stops: usize) -> Self {
        Constraints {
            max_stops,
            budget_ceiling: f64::INFINITY,
            preferred_airline: None,
            avoid_airlines: Vec::new(),
            max_duration: None,
        }
    }

    /// No stop limit, no budget.
    pub fn unconstrained() -> Self {
        Constraints::new(usize::MAX)
    }

    pub fn with_budget(mut self, budget_ceiling: f64) -> Self {
        self.budget_ceiling = budget_ceiling;
        self
    }

    pub fn prefer_airline(self, airline: impl Into<String>) -> Self {
        self.prefer_airline_with_penalty(airline, DEFAULT_PREFERENCE_PENALTY)
    }

    pub fn prefer_airline_with_penalty(
        mut self,
        airline: impl Into<String>,
        penalty_factor: f64,
    ) -> Self {
        self.preferred_airline = Some(AirlinePreference {
            airline: airline.into(),
            penalty_factor,
        });
        self
    }

    pub fn avoid_airline(mut self, airline: impl Into<String>) -> Self {
        self.avoid_airlines.push(airline.into());
        self
    }

    pub fn with_max_duration(mut self, minutes: u32) -> Self {
        self.max_duration = Some(minutes);
        self
    }

    /// Maximum number of flights a route may use.
    pub fn max_legs(&self) -> usize {
        self.max_stops.max(1)
    }

    /// Rejects constraint sets that no search could interpret.
    pub fn validate(&self) -> Result<(), Error> {
        if self.budget_ceiling.is_nan() || self.budget_ceiling < 0.0 {
            return Err(Error::InvalidQuery(format!(
                "budget ceiling must be a non-negative number, got {}",
                self.budget_ceiling
            )));
        }

        if let Some(preference) = &self.preferred_airline {
            if !preference.penalty_factor.is_finite() || preference.penalty_factor <= 0.0 {
                return Err(Error::InvalidQuery(format!(
                    "preference penalty factor must be positive, got {}",
                    preference.penalty_factor
                )));
            }
        }

        Ok(())
    }

    /// Whether a flight on `airline` may be boarded at all.
    pub fn allows(&self, airline: &str) -> bool {
        !self.avoid_airlines.iter().any(|avoided| avoided == airline)
    }

    /// Applies the airline preference to one flight's effective cost.
    pub fn adjusted_cost(&self, airline: &str, cost: f64) -> f64 {
        match &self.preferred_airline {
            Some(preference) if preference.airline != airline => {
                cost + cost.abs() * (preference.penalty_factor - 1.0)
            }
            _ => cost,
        }
    }
}
