use thiserror::Error;

/// Failures surfaced by graph construction and route queries.
///
/// Every variant is recoverable at the query level: a caller running a batch
/// of queries records the error and moves on to the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Indicates an attempt to access a node index that exceeds the graph size (N).
    #[error("Node index {0} is out of bounds.")]
    NodeIndexOutOfBounds(usize),

    /// Indicates a structural inconsistency found while building the graph.
    #[error("Graph structure is invalid: {0}")]
    InvalidGraph(String),

    /// Unknown city, negative stop allowance or budget, or a malformed preference.
    /// Rejected before any search runs.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// No sequence of flights connects the two cities, whatever the constraints.
    #[error("No route exists from {from} to {to}.")]
    Unreachable { from: String, to: String },

    /// The cities are connected, but no route satisfies the stop, budget,
    /// airline or duration constraints.
    #[error("No route from {from} to {to} satisfies the given constraints.")]
    Infeasible { from: String, to: String },

    /// A cycle with negative total effective weight is reachable from the source.
    /// `from -> to` is the edge that was still improvable after |V|-1 passes.
    #[error("Negative cycle detected: edge {from} -> {to} (weight {weight:.2}) still relaxes, cycle {cycle:?}")]
    NegativeCycle {
        from: String,
        to: String,
        weight: f64,
        cycle: Vec<String>,
    },

    /// Failed to trace the full cycle path, usually due to broken predecessor chains.
    #[error("Cycle path reconstruction failed due to broken predecessor chain.")]
    CycleReconstructionFailed,

    /// Failed to walk a route back from its destination to its source.
    #[error("Route reconstruction failed due to broken predecessor chain.")]
    PathReconstructionFailed,
}

impl Error {
    /// True for the two "no route" outcomes, which are expected answers rather
    /// than faults.
    pub fn is_no_route(&self) -> bool {
        matches!(self, Error::Unreachable { .. } | Error::Infeasible { .. })
    }
}
