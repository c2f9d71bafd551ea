pub mod bellman_ford;
pub mod csr;
pub mod dijkstra;
pub mod dp;
pub mod traits;
pub mod tree;

pub use bellman_ford::BellmanFordSolver;
pub use csr::{FlightGraph, GraphBuilder};
pub use dijkstra::DijkstraSolver;
pub use dp::ConstrainedSolver;
pub use traits::ShortestPathSolver;
pub use tree::ShortestPathTree;
