//! Undirected weighted multigraph used at every aggregation level.
//!
//! Wraps a petgraph [`UnGraph`] whose node weights are [`Node`] identities and
//! whose edge weights are [`Edge`] summaries. Self-loops and parallel edges are
//! both allowed: aggregation produces self-loops for intra-community edges, and
//! an aggregate edge records how many original edges it stands for.
//!
//! Degree conventions follow the usual undirected ones: a self-loop adds its
//! weight twice to the degree of its node, so the degree sum is always `2m`.

use crate::error::{Error, Result};
use crate::node::Node;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Edge payload: how many original edges this edge summarizes, and their total weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Number of original edges.
    pub multiplicity: usize,
    /// Sum of the original edge weights.
    pub weight: f64,
}

impl Edge {
    /// A single original edge.
    pub fn new(weight: f64) -> Self {
        Self {
            multiplicity: 1,
            weight,
        }
    }
}

/// Which edge quantity a computation reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Weighting {
    /// Count edges: every original edge contributes 1.
    #[default]
    Unit,
    /// Sum stored edge weights.
    Weighted,
}

impl Weighting {
    /// The value of `edge` under this weighting.
    #[inline]
    pub fn of(self, edge: &Edge) -> f64 {
        match self {
            Weighting::Unit => edge.multiplicity as f64,
            Weighting::Weighted => edge.weight,
        }
    }
}

/// Per-node quantities that partitions cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NodeStats {
    /// Leaf count of the node.
    pub size: usize,
    pub unit_degree: f64,
    pub weighted_degree: f64,
}

impl NodeStats {
    #[inline]
    pub fn degree(&self, weighting: Weighting) -> f64 {
        match weighting {
            Weighting::Unit => self.unit_degree,
            Weighting::Weighted => self.weighted_degree,
        }
    }
}

/// An undirected multigraph over [`Node`] identities.
#[derive(Debug, Clone)]
pub struct Graph {
    inner: UnGraph<Node, Edge>,
    stats: Arc<[NodeStats]>,
    unit_total: f64,
    weighted_total: f64,
}

impl Graph {
    /// Build a graph over leaf nodes `0..n` from `(u, v, weight)` triples.
    ///
    /// Every triple is its own edge: repeating a pair adds a parallel edge,
    /// and `u == v` adds a self-loop.
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut inner = UnGraph::with_capacity(n, 0);
        for id in 0..n {
            let _ = inner.add_node(Node::leaf(id));
        }
        for (u, v, w) in edges {
            for node in [u, v] {
                if node >= n {
                    return Err(Error::NodeOutOfBounds {
                        node,
                        node_count: n,
                    });
                }
            }
            let _ = inner.add_edge(NodeIndex::new(u), NodeIndex::new(v), Edge::new(w));
        }
        Ok(Self::from_inner(inner))
    }

    /// Convert a petgraph graph, giving every edge unit weight.
    ///
    /// Node `i` of the result is `Node::Leaf(i)` for petgraph index `i`.
    pub fn from_petgraph<N, E>(graph: &UnGraph<N, E>) -> Self {
        Self::from_petgraph_with(graph, |_| 1.0)
    }

    /// Convert a petgraph graph, reading edge weights with `weight_fn`.
    pub fn from_petgraph_with<N, E, F>(graph: &UnGraph<N, E>, weight_fn: F) -> Self
    where
        F: Fn(&E) -> f64,
    {
        let inner = graph.map(
            |idx, _| Node::leaf(idx.index()),
            |_, weight| Edge::new(weight_fn(weight)),
        );
        Self::from_inner(inner)
    }

    /// Build a graph from explicit node identities and summarized edges.
    ///
    /// Used by aggregation; `sizes[i]` is the leaf count of `nodes[i]`.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        sizes: &[usize],
        edges: Vec<(usize, usize, Edge)>,
    ) -> Self {
        let mut inner = UnGraph::with_capacity(nodes.len(), edges.len());
        for node in nodes {
            let _ = inner.add_node(node);
        }
        for (u, v, edge) in edges {
            let _ = inner.add_edge(NodeIndex::new(u), NodeIndex::new(v), edge);
        }
        Self::with_sizes(inner, |i| sizes[i])
    }

    fn from_inner(inner: UnGraph<Node, Edge>) -> Self {
        Self::with_sizes(inner, |_| 1)
    }

    fn with_sizes(inner: UnGraph<Node, Edge>, size_of: impl Fn(usize) -> usize) -> Self {
        let mut stats: Vec<NodeStats> = (0..inner.node_count())
            .map(|i| NodeStats {
                size: size_of(i),
                unit_degree: 0.0,
                weighted_degree: 0.0,
            })
            .collect();

        let mut unit_total = 0.0;
        let mut weighted_total = 0.0;
        for edge in inner.edge_references() {
            let unit = Weighting::Unit.of(edge.weight());
            let weighted = Weighting::Weighted.of(edge.weight());
            unit_total += unit;
            weighted_total += weighted;
            // A self-loop lands on the same node twice.
            for endpoint in [edge.source(), edge.target()] {
                let s = &mut stats[endpoint.index()];
                s.unit_degree += unit;
                s.weighted_degree += weighted;
            }
        }

        Self {
            inner,
            stats: stats.into(),
            unit_total,
            weighted_total,
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of original edges (sum of multiplicities).
    pub fn edge_count(&self) -> usize {
        self.inner
            .edge_references()
            .map(|e| e.weight().multiplicity)
            .sum()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    /// Node indices in ascending order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.inner.node_indices()
    }

    /// The identity of node `v`.
    pub fn node(&self, v: NodeIndex) -> &Node {
        &self.inner[v]
    }

    /// All node identities, in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.inner.node_indices().map(move |v| &self.inner[v])
    }

    /// Leaf count of node `v`.
    pub fn node_size(&self, v: NodeIndex) -> usize {
        self.stats[v.index()].size
    }

    /// Distinct neighbors of `v`, excluding `v` itself, in ascending order.
    pub fn neighbors(&self, v: NodeIndex) -> Vec<NodeIndex> {
        let set: BTreeSet<NodeIndex> = self.inner.neighbors(v).filter(|&u| u != v).collect();
        set.into_iter().collect()
    }

    /// Edges incident to `v` as `(other endpoint, edge)` pairs.
    ///
    /// A self-loop reports `v` as its other endpoint.
    pub fn incident_edges(&self, v: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Edge)> + '_ {
        self.inner.edges(v).map(move |e| {
            let other = if e.source() == v { e.target() } else { e.source() };
            (other, e.weight())
        })
    }

    /// All edges as `(u, v, edge)` triples, each edge once.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Edge)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    /// Degree of `v`; self-loops count twice.
    pub fn weighted_degree(&self, v: NodeIndex, weighting: Weighting) -> f64 {
        self.stats[v.index()].degree(weighting)
    }

    /// Total edge weight `m` (half the degree sum).
    pub fn total_weight(&self, weighting: Weighting) -> f64 {
        match weighting {
            Weighting::Unit => self.unit_total,
            Weighting::Weighted => self.weighted_total,
        }
    }

    /// Weight of edges with one endpoint in `a` and the other in `b`.
    ///
    /// Each edge counts once. Passing the same set twice gives the weight of
    /// the subgraph induced by it, self-loops included.
    pub fn edge_weight_between(
        &self,
        a: &BTreeSet<NodeIndex>,
        b: &BTreeSet<NodeIndex>,
        weighting: Weighting,
    ) -> f64 {
        self.inner
            .edge_references()
            .filter(|e| {
                let (s, t) = (e.source(), e.target());
                (a.contains(&s) && b.contains(&t)) || (b.contains(&s) && a.contains(&t))
            })
            .map(|e| weighting.of(e.weight()))
            .sum()
    }

    pub(crate) fn stats(&self) -> &Arc<[NodeStats]> {
        &self.stats
    }

    /// The underlying petgraph graph.
    pub fn as_petgraph(&self) -> &UnGraph<Node, Edge> {
        &self.inner
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn idx(ids: &[usize]) -> BTreeSet<NodeIndex> {
        ids.iter().copied().map(NodeIndex::new).collect()
    }

    #[test]
    fn test_from_edges_rejects_unknown_nodes() {
        let result = Graph::from_edges(3, [(0, 1, 1.0), (1, 3, 1.0)]);
        assert_eq!(
            result.unwrap_err(),
            Error::NodeOutOfBounds {
                node: 3,
                node_count: 3
            }
        );
    }

    #[test]
    fn test_degrees_count_self_loops_twice() {
        let g = Graph::from_edges(3, [(0, 1, 2.0), (1, 1, 0.5), (1, 2, 1.0), (1, 2, 1.0)]).unwrap();

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.weighted_degree(NodeIndex::new(1), Weighting::Unit), 5.0);
        assert_eq!(g.weighted_degree(NodeIndex::new(1), Weighting::Weighted), 5.0);
        assert_eq!(g.weighted_degree(NodeIndex::new(0), Weighting::Weighted), 2.0);
        assert_eq!(g.total_weight(Weighting::Unit), 4.0);
        assert_eq!(g.total_weight(Weighting::Weighted), 4.5);

        let degree_sum: f64 = g
            .node_indices()
            .map(|v| g.weighted_degree(v, Weighting::Weighted))
            .sum();
        assert_eq!(degree_sum, 2.0 * g.total_weight(Weighting::Weighted));
    }

    #[test]
    fn test_neighbors_are_distinct() {
        let g = Graph::from_edges(3, [(0, 1, 1.0), (0, 1, 1.0), (0, 0, 1.0), (2, 0, 1.0)]).unwrap();
        assert_eq!(g.neighbors(NodeIndex::new(0)), vec![NodeIndex::new(1), NodeIndex::new(2)]);

        let others: Vec<usize> = g
            .incident_edges(NodeIndex::new(2))
            .map(|(u, _)| u.index())
            .collect();
        assert_eq!(others, vec![0]);
    }

    #[test]
    fn test_edge_weight_between() {
        // Path 0 - 1 - 2 - 3 plus a self-loop on 3.
        let g = Graph::from_edges(4, [(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0), (3, 3, 4.0)]).unwrap();

        let left = idx(&[0, 1]);
        let right = idx(&[2, 3]);
        assert_eq!(g.edge_weight_between(&left, &right, Weighting::Weighted), 2.0);
        assert_eq!(g.edge_weight_between(&left, &right, Weighting::Unit), 1.0);
        assert_eq!(g.edge_weight_between(&right, &right, Weighting::Weighted), 7.0);
        assert_eq!(g.edge_weight_between(&right, &right, Weighting::Unit), 2.0);
        assert_eq!(g.edge_weight_between(&left, &idx(&[]), Weighting::Unit), 0.0);
    }

    #[test]
    fn test_from_petgraph() {
        let mut pg = UnGraph::<&str, f64>::new_undirected();
        let a = pg.add_node("a");
        let b = pg.add_node("b");
        let c = pg.add_node("c");
        let _ = pg.add_edge(a, b, 0.5);
        let _ = pg.add_edge(b, c, 2.5);

        let unit = Graph::from_petgraph(&pg);
        assert_eq!(unit.total_weight(Weighting::Weighted), 2.0);
        assert_eq!(unit.node(b), &Node::leaf(1));

        let weighted = Graph::from_petgraph_with(&pg, |w| *w);
        assert_eq!(weighted.total_weight(Weighting::Weighted), 3.0);
        assert_eq!(weighted.weighted_degree(b, Weighting::Weighted), 3.0);
        assert_eq!(weighted.node_size(c), 1);
    }
}
