use thiserror::Error;

/// Result alias for `commune`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, partitions and the detection drivers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// An edge referenced a node that does not exist.
    #[error("node {node} out of bounds for graph with {node_count} nodes")]
    NodeOutOfBounds {
        /// Offending node index.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The given communities do not form a partition of the graph's nodes.
    #[error("invalid partition: {0}")]
    InvalidPartition(PartitionViolation),
}

/// The way a set of communities failed to partition a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PartitionViolation {
    /// A community contains a node that is not in the graph.
    #[error("node {0} is not in the graph")]
    UnknownNode(usize),

    /// A graph node is not covered by any community.
    #[error("node {0} is not in any community")]
    MissingNode(usize),

    /// A node appears in more than one community.
    #[error("node {0} appears in more than one community")]
    OverlappingCommunities(usize),

    /// A partition built for one graph was used with another.
    #[error("partition covers {found} nodes, graph has {expected}")]
    NodeCountMismatch {
        /// Node count of the graph.
        expected: usize,
        /// Node count the partition was built for.
        found: usize,
    },

    /// The partition was built for a different graph with the same node count.
    #[error("partition was built for a different graph")]
    ForeignGraph,
}

impl From<PartitionViolation> for Error {
    fn from(violation: PartitionViolation) -> Self {
        Error::InvalidPartition(violation)
    }
}
