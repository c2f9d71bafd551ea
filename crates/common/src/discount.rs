use serde::{Deserialize, Serialize};

use super::types::Flight;

/// Default share of the base fare that `BestCapped` pricing may remove.
pub const DEFAULT_MAX_DISCOUNT_FRACTION: f64 = 0.5;

/// A discount rule attached to a flight.
///
/// Each variant carries its own applicability predicate and adjustment; the
/// adjustment is the amount subtracted from the base fare. Nothing stops the
/// adjustments of several rules from exceeding the fare, which is how
/// negative effective weights arise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscountRule {
    /// Frequent-flyer reduction on one airline: a percentage of the fare plus a flat amount.
    Loyalty {
        airline: String,
        #[serde(default)]
        percent: f64,
        #[serde(default)]
        amount: f64,
    },
    /// Percentage off during the listed travel months (1-12). An empty list
    /// means the season covers the whole year.
    Seasonal {
        percent: f64,
        #[serde(default)]
        months: Vec<u8>,
    },
    /// Plain percentage off, restricted to `airlines` when non-empty.
    Percentage {
        percent: f64,
        #[serde(default)]
        airlines: Vec<String>,
    },
    /// Flat cashback (e.g. a card offer), restricted to `airlines` when non-empty.
    Cashback {
        amount: f64,
        #[serde(default)]
        airlines: Vec<String>,
    },
}

fn airline_matches(airlines: &[String], airline: &str) -> bool {
    airlines.is_empty() || airlines.iter().any(|a| a == airline)
}

impl DiscountRule {
    /// Whether the rule's predicate holds for `flight`.
    pub fn applies_to(&self, flight: &Flight) -> bool {
        match self {
            DiscountRule::Loyalty { airline, .. } => *airline == flight.airline,
            DiscountRule::Seasonal { months, .. } => {
                months.is_empty()
                    || flight
                        .travel_month
                        .is_some_and(|month| months.contains(&month))
            }
            DiscountRule::Percentage { airlines, .. } | DiscountRule::Cashback { airlines, .. } => {
                airline_matches(airlines, &flight.airline)
            }
        }
    }

    /// Amount this rule takes off the flight's base fare (0.0 when it does not apply).
    pub fn adjustment(&self, flight: &Flight) -> f64 {
        if !self.applies_to(flight) {
            return 0.0;
        }

        match self {
            DiscountRule::Loyalty {
                percent, amount, ..
            } => flight.base_fare * percent / 100.0 + amount,
            DiscountRule::Seasonal { percent, .. } | DiscountRule::Percentage { percent, .. } => {
                flight.base_fare * percent / 100.0
            }
            DiscountRule::Cashback { amount, .. } => *amount,
        }
    }
}

/// How the adjustments of several matching rules combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountPolicy {
    /// Every matching rule applies; the effective weight may drop below zero.
    #[default]
    Stack,
    /// Only the largest adjustment applies, capped at `max_discount_fraction`
    /// of the base fare.
    BestCapped,
}

/// Turns a flight into the effective weight the solvers see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub policy: DiscountPolicy,
    pub max_discount_fraction: f64,
    /// Added per minute of flight time, so that slow flights cost a little more.
    pub duration_penalty_per_minute: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing {
            policy: DiscountPolicy::Stack,
            max_discount_fraction: DEFAULT_MAX_DISCOUNT_FRACTION,
            duration_penalty_per_minute: 0.0,
        }
    }
}

impl Pricing {
    /// Total amount taken off the base fare of `flight` under this policy.
    pub fn total_discount(&self, flight: &Flight) -> f64 {
        match self.policy {
            DiscountPolicy::Stack => flight
                .discounts
                .iter()
                .map(|rule| rule.adjustment(flight))
                .sum(),
            DiscountPolicy::BestCapped => {
                let best = flight
                    .discounts
                    .iter()
                    .map(|rule| rule.adjustment(flight))
                    .fold(0.0f64, f64::max);
                best.min(flight.base_fare * self.max_discount_fraction)
            }
        }
    }

    /// Fare after discounts, before the duration penalty.
    pub fn discounted_fare(&self, flight: &Flight) -> f64 {
        flight.base_fare - self.total_discount(flight)
    }

    /// The edge weight used by every solver.
    pub fn effective_weight(&self, flight: &Flight) -> f64 {
        self.discounted_fare(flight)
            + f64::from(flight.duration_minutes) * self.duration_penalty_per_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(airline: &str, base_fare: f64) -> Flight {
        Flight::new(0, 1, airline, base_fare, 120)
    }

    fn assert_approx_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} is not approximately equal to {}", a, b);
    }

    #[test]
    fn loyalty_applies_only_to_its_airline() {
        let rule = DiscountRule::Loyalty {
            airline: "IndiGo".to_string(),
            percent: 15.0,
            amount: 0.0,
        };

        assert_approx_eq(rule.adjustment(&flight("IndiGo", 4000.0)), 600.0);
        assert_approx_eq(rule.adjustment(&flight("SpiceJet", 4000.0)), 0.0);
    }

    #[test]
    fn seasonal_window_requires_matching_month() {
        let rule = DiscountRule::Seasonal {
            percent: 25.0,
            months: vec![6, 7],
        };

        assert_approx_eq(rule.adjustment(&flight("IndiGo", 1000.0).with_travel_month(6)), 250.0);
        assert_approx_eq(rule.adjustment(&flight("IndiGo", 1000.0).with_travel_month(12)), 0.0);
        // Unknown travel month never falls inside an explicit window.
        assert_approx_eq(rule.adjustment(&flight("IndiGo", 1000.0)), 0.0);

        let all_year = DiscountRule::Seasonal {
            percent: 25.0,
            months: Vec::new(),
        };
        assert_approx_eq(all_year.adjustment(&flight("IndiGo", 1000.0)), 250.0);
    }

    #[test]
    fn cashback_is_flat() {
        let rule = DiscountRule::Cashback {
            amount: 1000.0,
            airlines: Vec::new(),
        };
        assert_approx_eq(rule.adjustment(&flight("Vistara", 5000.0)), 1000.0);
    }

    #[test]
    fn stacked_discounts_can_go_negative() {
        let f = flight("IndiGo", 100.0).with_discount(DiscountRule::Loyalty {
            airline: "IndiGo".to_string(),
            percent: 0.0,
            amount: 120.0,
        });

        let pricing = Pricing::default();
        assert_approx_eq(pricing.effective_weight(&f), -20.0);
    }

    #[test]
    fn best_capped_takes_largest_and_caps_it() {
        let f = flight("Jet Airways", 1500.0)
            .with_discount(DiscountRule::Loyalty {
                airline: "Jet Airways".to_string(),
                percent: 20.0,
                amount: 0.0,
            })
            .with_discount(DiscountRule::Cashback {
                amount: 1000.0,
                airlines: Vec::new(),
            });

        let pricing = Pricing {
            policy: DiscountPolicy::BestCapped,
            ..Pricing::default()
        };

        // Cashback (1000) beats loyalty (300) but is capped at half the fare.
        assert_approx_eq(pricing.total_discount(&f), 750.0);
        assert_approx_eq(pricing.effective_weight(&f), 750.0);
    }

    #[test]
    fn duration_penalty_is_added() {
        let pricing = Pricing {
            duration_penalty_per_minute: 0.05,
            ..Pricing::default()
        };
        // 120 minutes * 0.05 = 6.0
        assert_approx_eq(pricing.effective_weight(&flight("IndiGo", 1000.0)), 1006.0);
    }
}
