use common::discount::{DiscountRule, Pricing};
use flight_router_core::FlightGraph;

/// The discount table attached to every loaded flight unless configuration
/// supplies its own.
pub fn default_discounts() -> Vec<DiscountRule> {
    vec![
        DiscountRule::Loyalty {
            airline: "IndiGo".to_string(),
            percent: 15.0,
            amount: 0.0,
        },
        DiscountRule::Loyalty {
            airline: "Jet Airways".to_string(),
            percent: 20.0,
            amount: 0.0,
        },
        // Credit-card cashback, any airline.
        DiscountRule::Cashback {
            amount: 1000.0,
            airlines: Vec::new(),
        },
        // Off-peak, all year unless months are configured.
        DiscountRule::Seasonal {
            percent: 25.0,
            months: Vec::new(),
        },
    ]
}

/// How much the discount table took off the fares of a built graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountSummary {
    pub total_flights: usize,
    pub discounted_flights: usize,
    pub total_base_fare: f64,
    pub total_savings: f64,
    pub negative_weight_flights: usize,
}

impl DiscountSummary {
    pub fn from_graph(graph: &FlightGraph, pricing: &Pricing) -> Self {
        let mut summary = DiscountSummary {
            total_flights: graph.num_edges(),
            discounted_flights: 0,
            total_base_fare: 0.0,
            total_savings: 0.0,
            negative_weight_flights: 0,
        };

        for (i, flight) in graph.flights.iter().enumerate() {
            let saving = pricing.total_discount(flight);
            summary.total_base_fare += flight.base_fare;
            if saving > 0.0 {
                summary.discounted_flights += 1;
                summary.total_savings += saving;
            }
            if graph.edge_weights[i] < 0.0 {
                summary.negative_weight_flights += 1;
            }
        }

        summary
    }

    /// Mean saving over the discounted flights.
    pub fn average_saving(&self) -> f64 {
        if self.discounted_flights == 0 {
            0.0
        } else {
            self.total_savings / self.discounted_flights as f64
        }
    }
}
