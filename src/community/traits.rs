//! Community detection traits.

use crate::error::Result;
use petgraph::graph::UnGraph;

/// Trait for community detection algorithms over petgraph graphs.
pub trait CommunityDetection {
    /// Detect communities in a graph, ignoring node and edge payloads.
    ///
    /// Returns a mapping from node index to community ID. IDs are
    /// consecutive, starting at 0.
    fn detect<N, E>(&self, graph: &UnGraph<N, E>) -> Result<Vec<usize>>;

    /// Get the resolution parameter (if applicable).
    fn resolution(&self) -> f64 {
        1.0
    }
}
