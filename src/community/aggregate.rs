//! Graph aggregation and the partition bookkeeping around it.
//!
//! Aggregation contracts every community of the refined partition into one
//! node. Node `i` of the aggregate graph is the `i`-th live community of the
//! refined partition, in slot order, and its identity is the set of the
//! members' identities. Edges between two communities collapse into one
//! edge carrying their summed multiplicity and weight, and edges inside a
//! community become a self-loop, so totals and degrees are preserved.

use crate::error::Result;
use crate::graph::{Edge, Graph};
use crate::node::Node;
use crate::partition::Partition;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet};

/// Contract each community of `partition` into a single node.
///
/// `partition` must be a partition of `graph`.
pub fn aggregate_graph(graph: &Graph, partition: &Partition) -> Graph {
    let position = aggregate_positions(partition);

    let mut nodes = Vec::with_capacity(partition.len());
    let mut sizes = Vec::with_capacity(partition.len());
    for (id, members) in partition.communities() {
        nodes.push(Node::aggregate(members.iter().map(|&v| graph.node(v).clone())));
        sizes.push(partition.size(id));
    }

    let mut summed: BTreeMap<(usize, usize), Edge> = BTreeMap::new();
    for (u, v, edge) in graph.edges() {
        let (a, b) = (position[u.index()], position[v.index()]);
        let entry = summed.entry((a.min(b), a.max(b))).or_insert(Edge {
            multiplicity: 0,
            weight: 0.0,
        });
        entry.multiplicity += edge.multiplicity;
        entry.weight += edge.weight;
    }

    let edges = summed.into_iter().map(|((a, b), edge)| (a, b, edge)).collect();
    Graph::from_parts(nodes, &sizes, edges)
}

/// Re-express `coarse` over the nodes of `aggregate`.
///
/// `refined` must refine `coarse`, and `aggregate` must be
/// `aggregate_graph(graph, refined)`. Each coarse community becomes the set
/// of aggregate nodes built from the refined communities inside it.
pub(crate) fn lift_partition(
    coarse: &Partition,
    refined: &Partition,
    aggregate: &Graph,
) -> Result<Partition> {
    let position = aggregate_positions(refined);
    let lifted = coarse.communities().map(|(_, members)| {
        members
            .iter()
            .map(|v| NodeIndex::new(position[v.index()]))
            .collect::<BTreeSet<_>>()
    });
    Partition::new(aggregate, lifted)
}

/// Expand `partition` of a possibly aggregated `graph` into a partition of
/// `original`, whose nodes are the leaves.
pub(crate) fn flatten_partition(
    original: &Graph,
    graph: &Graph,
    partition: &Partition,
) -> Result<Partition> {
    let leaves = partition.communities().map(|(_, members)| {
        members
            .iter()
            .flat_map(|&v| graph.node(v).flatten())
            .map(NodeIndex::new)
            .collect::<Vec<_>>()
    });
    Partition::new(original, leaves)
}

/// Aggregate node index of every node, following live-slot order.
fn aggregate_positions(partition: &Partition) -> Vec<usize> {
    let mut position = vec![0; partition.node_count()];
    for (i, (_, members)) in partition.communities().enumerate() {
        for v in members {
            position[v.index()] = i;
        }
    }
    position
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::Weighting;
    use crate::quality::{Cpm, Modularity, QualityMetric};

    fn complete(n: usize) -> Graph {
        let edges = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j, 1.0)));
        Graph::from_edges(n, edges).unwrap()
    }

    fn partition(graph: &Graph, sets: &[&[usize]]) -> Partition {
        Partition::new(
            graph,
            sets.iter()
                .map(|s| s.iter().copied().map(NodeIndex::new).collect::<Vec<_>>()),
        )
        .unwrap()
    }

    fn set(ids: &[usize]) -> BTreeSet<NodeIndex> {
        ids.iter().copied().map(NodeIndex::new).collect()
    }

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn test_aggregate_k5() {
        let k5 = complete(5);
        let p = partition(&k5, &[&[0], &[1, 2], &[3, 4]]);
        let agg = aggregate_graph(&k5, &p);

        assert_eq!(agg.node_count(), 3);
        assert_eq!(agg.edge_count(), 10);

        let expected: Vec<Node> = vec![
            Node::aggregate([Node::leaf(0)]),
            Node::aggregate([Node::leaf(1), Node::leaf(2)]),
            Node::aggregate([Node::leaf(3), Node::leaf(4)]),
        ];
        assert_eq!(agg.nodes().cloned().collect::<Vec<_>>(), expected);

        let between = |a: &[usize], b: &[usize]| {
            agg.edge_weight_between(&set(a), &set(b), Weighting::Unit)
        };
        assert_eq!(between(&[0], &[1]), 2.0);
        assert_eq!(between(&[0], &[2]), 2.0);
        assert_eq!(between(&[1], &[2]), 4.0);
        assert_eq!(between(&[0], &[0]), 0.0);
        assert_eq!(between(&[1], &[1]), 1.0);
        assert_eq!(between(&[2], &[2]), 1.0);

        assert_eq!(agg.node_size(n(1)), 2);
    }

    #[test]
    fn test_aggregate_preserves_totals_and_quality() {
        let graph = Graph::from_edges(
            6,
            [(0, 1, 2.0), (1, 2, 0.5), (2, 3, 1.5), (3, 4, 1.0), (4, 5, 2.5), (5, 0, 1.0), (2, 2, 3.0)],
        )
        .unwrap();
        let p = partition(&graph, &[&[0, 1], &[2, 3], &[4, 5]]);
        let agg = aggregate_graph(&graph, &p);

        for w in [Weighting::Unit, Weighting::Weighted] {
            assert_eq!(agg.total_weight(w), graph.total_weight(w));
            // Same communities, one level up.
            let coarse = Partition::trivial(&graph);
            let lifted = lift_partition(&coarse, &p, &agg).unwrap();
            for metric in [&Modularity::new(1.0) as &dyn QualityMetric, &Cpm::new(0.2)] {
                let before = metric.score(&graph, &coarse, w);
                let after = metric.score(&agg, &lifted, w);
                assert!((before - after).abs() < 1e-12);
            }
        }
        assert_eq!(agg.weighted_degree(n(1), Weighting::Weighted), 0.5 + 3.0 * 2.0 + 1.5 * 2.0 + 1.0);
    }

    #[test]
    fn test_lift_groups_refined_communities() {
        let graph = complete(6);
        let coarse = partition(&graph, &[&[0, 1, 2, 3], &[4, 5]]);
        let refined = partition(&graph, &[&[0, 1], &[2, 3], &[4], &[5]]);
        let agg = aggregate_graph(&graph, &refined);
        let lifted = lift_partition(&coarse, &refined, &agg).unwrap();

        let expected: BTreeSet<BTreeSet<NodeIndex>> = [set(&[0, 1]), set(&[2, 3])].into_iter().collect();
        assert_eq!(lifted.as_set(), expected);
    }

    #[test]
    fn test_flatten_two_levels() {
        let graph = complete(6);
        let first = partition(&graph, &[&[0, 1], &[2], &[3, 4], &[5]]);
        let level1 = aggregate_graph(&graph, &first);
        let second = partition(&level1, &[&[0, 1], &[2, 3]]);
        let level2 = aggregate_graph(&level1, &second);

        assert_eq!(level2.node(n(0)).depth(), 2);
        let flat = flatten_partition(&graph, &level2, &Partition::singletons(&level2)).unwrap();
        let expected: BTreeSet<BTreeSet<NodeIndex>> = [set(&[0, 1, 2]), set(&[3, 4, 5])].into_iter().collect();
        assert_eq!(flat.as_set(), expected);
    }
}
