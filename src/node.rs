//! Recursive node identity.
//!
//! Every aggregation level turns the communities of the level below into
//! single nodes, so a node is either an original vertex or a set of nodes
//! from the previous level:
//!
//! ```text
//! level 0:  0   1   2   3   4
//! level 1:  {0, 1}   {2}   {3, 4}
//! level 2:  {{0, 1}, {2}}   {{3, 4}}
//! ```
//!
//! Ordering and hashing are structural, so two aggregates built from the
//! same members compare equal regardless of the order they were collected in.

use core::fmt;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Identity of a graph node at some aggregation level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// An original vertex, identified by its index in the input graph.
    Leaf(usize),
    /// A community of nodes from the level below.
    Aggregate(Arc<BTreeSet<Node>>),
}

impl Node {
    /// Create a leaf node.
    pub fn leaf(id: usize) -> Self {
        Node::Leaf(id)
    }

    /// Create an aggregate node from its members.
    pub fn aggregate<I: IntoIterator<Item = Node>>(members: I) -> Self {
        Node::Aggregate(Arc::new(members.into_iter().collect()))
    }

    /// Check if this is an original vertex.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Members one level down (empty for leaves).
    pub fn members(&self) -> impl Iterator<Item = &Node> {
        let members = match self {
            Node::Leaf(_) => None,
            Node::Aggregate(members) => Some(members.iter()),
        };
        members.into_iter().flatten()
    }

    /// Number of original vertices below this node.
    ///
    /// This is the leaf count, not the number of immediate members:
    /// `{{0, 1}, {2}}` has size 3.
    pub fn size(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Aggregate(members) => members.iter().map(Node::size).sum(),
        }
    }

    /// Number of aggregation levels above the leaves.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Aggregate(members) => 1 + members.iter().map(Node::depth).max().unwrap_or(0),
        }
    }

    /// The original vertex ids below this node.
    pub fn flatten(&self) -> BTreeSet<usize> {
        let mut leaves = BTreeSet::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, out: &mut BTreeSet<usize>) {
        match self {
            Node::Leaf(id) => {
                let _ = out.insert(*id);
            }
            Node::Aggregate(members) => {
                for member in members.iter() {
                    member.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(id) => write!(f, "{id}"),
            Node::Aggregate(members) => {
                write!(f, "{{")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
