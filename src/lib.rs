//! # commune
//!
//! Leiden and Louvain community detection over undirected multigraphs.
//!
//! Each aggregation level contracts communities into [`Node::Aggregate`]
//! nodes, so the graph a level works on remembers exactly which original
//! vertices every node stands for. Quality is pluggable through
//! [`QualityMetric`]: [`Modularity`] and the Constant Potts Model ([`Cpm`])
//! are provided, both with exact single-move deltas.
//!
//! ```rust
//! use commune::{Graph, Leiden, Modularity, Partition};
//!
//! // Two triangles joined by one edge.
//! let graph = Graph::from_edges(
//!     6,
//!     [(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0), (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0), (2, 3, 1.0)],
//! )?;
//! let start = Partition::singletons(&graph);
//! let found = Leiden::new(Modularity::new(1.0)).run(&graph, Some(&start))?;
//! assert_eq!(found.len(), 2);
//! # Ok::<(), commune::Error>(())
//! ```
//!
//! All randomness comes from a seedable generator, so runs are reproducible.
//! The `parallel` feature evaluates the candidate moves of each node on the
//! rayon thread pool.

pub mod community;
/// Error types used across `commune`.
pub mod error;
pub mod graph;
pub mod node;
pub mod partition;
pub mod quality;

pub use community::{CommunityDetection, Leiden, Louvain};
pub use error::{Error, PartitionViolation, Result};
pub use graph::{Edge, Graph, Weighting};
pub use node::Node;
pub use partition::{CommunityId, Partition, Target};
pub use quality::{Cpm, Modularity, QualityMetric};
