//! Well-connectedness constrained refinement.
//!
//! Refinement starts over from singletons and only ever merges nodes that
//! share a community of the coarse partition. Inside a coarse community C
//! with leaf count |C| a node is eligible when
//!
//! ```text
//! E(v, C − v) ≥ γ·|v|·(|C| − |v|)
//! ```
//!
//! and a refined community D is an admissible target when the same bound
//! holds for D. Eligible nodes are visited in random order; each one that is
//! still alone joins an admissible target with non-negative gain, drawn with
//! probability proportional to `exp(gain / θ)`. Staying alone is one of the
//! options whenever the node's own community is admissible.
//!
//! With a positive resolution, joining a community the node has no edge into
//! always loses quality, so refined communities stay connected.

use crate::graph::{Graph, Weighting};
use crate::partition::{CommunityId, Partition, Target};
use crate::quality::{weight_to, QualityMetric};
use log::trace;
use petgraph::graph::NodeIndex;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Refine `partition` into well-connected sub-communities.
///
/// The result is a partition of the same graph in which every community is
/// contained in a community of `partition`.
pub fn refine_partition<Q, R>(
    graph: &Graph,
    partition: &Partition,
    quality: &Q,
    theta: f64,
    gamma: f64,
    weighting: Weighting,
    rng: &mut R,
) -> Partition
where
    Q: QualityMetric + ?Sized,
    R: Rng + ?Sized,
{
    let mut refined = Partition::singletons(graph);
    for (_, members) in partition.communities() {
        refined = merge_nodes_subset(
            graph, refined, quality, theta, gamma, weighting, members, rng,
        );
    }

    trace!(
        "refinement: {} coarse communities refined into {}",
        partition.len(),
        refined.len()
    );
    refined
}

/// Merge the nodes of `subset` inside `refined`.
///
/// Every node of `subset` must be a singleton of `refined`; nodes outside
/// `subset` are left where they are.
#[allow(clippy::too_many_arguments)]
pub fn merge_nodes_subset<Q, R>(
    graph: &Graph,
    refined: Partition,
    quality: &Q,
    theta: f64,
    gamma: f64,
    weighting: Weighting,
    subset: &BTreeSet<NodeIndex>,
    rng: &mut R,
) -> Partition
where
    Q: QualityMetric + ?Sized,
    R: Rng + ?Sized,
{
    let mut refined = refined;
    let total: usize = subset.iter().map(|&v| graph.node_size(v)).sum();
    let well_connected =
        |external: f64, size: usize| external >= gamma * size as f64 * (total - size) as f64;

    // Weight from each node, and then from each refined community, to the
    // rest of the subset.
    let node_external: BTreeMap<NodeIndex, f64> = subset
        .iter()
        .map(|&v| {
            let external = graph
                .incident_edges(v)
                .filter(|&(u, _)| u != v && subset.contains(&u))
                .map(|(_, edge)| weighting.of(edge))
                .sum();
            (v, external)
        })
        .collect();
    let mut external: BTreeMap<CommunityId, f64> = node_external
        .iter()
        .map(|(&v, &x)| (refined.community_of(v), x))
        .collect();

    let mut eligible: Vec<NodeIndex> = node_external
        .iter()
        .filter(|&(&v, &x)| well_connected(x, graph.node_size(v)))
        .map(|(&v, _)| v)
        .collect();
    eligible.shuffle(rng);

    let mut merges = 0usize;
    for v in eligible {
        if refined.node_community(v).len() != 1 {
            continue;
        }
        let own = refined.community_of(v);

        let mut targets = Vec::new();
        let mut gains = Vec::new();
        for (&d, &x) in &external {
            if !well_connected(x, refined.size(d)) {
                continue;
            }
            let gain = quality.delta(graph, &refined, v, Target::Community(d), weighting);
            if gain >= 0.0 {
                targets.push(d);
                gains.push(gain);
            }
        }
        if targets.is_empty() {
            continue;
        }

        let best = gains.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = gains.iter().map(|g| ((g - best) / theta).exp()).collect();
        let Ok(choice) = WeightedIndex::new(&weights) else {
            continue;
        };
        let chosen = targets[choice.sample(rng)];
        if chosen == own {
            continue;
        }

        let into_chosen = weight_to(graph, &refined, v, Some(chosen), weighting);
        refined = refined.into_moved(v, Target::Community(chosen));
        if let Some(x) = external.get_mut(&chosen) {
            *x += node_external[&v] - 2.0 * into_chosen;
        }
        let _ = external.remove(&own);
        merges += 1;
    }

    trace!("merged {} of {} subset nodes", merges, subset.len());
    refined
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::quality::{Cpm, Modularity};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    fn barbell() -> Graph {
        let mut edges = Vec::new();
        for (lo, hi) in [(0, 5), (7, 12)] {
            for u in lo..hi {
                for v in u + 1..hi {
                    edges.push((u, v, 1.0));
                }
            }
        }
        edges.extend([(4, 5, 1.0), (5, 6, 1.0), (6, 7, 1.0)]);
        Graph::from_edges(12, edges).unwrap()
    }

    fn is_connected(graph: &Graph, members: &BTreeSet<NodeIndex>) -> bool {
        let Some(&start) = members.iter().next() else {
            return true;
        };
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for u in graph.neighbors(v) {
                if members.contains(&u) && seen.insert(u) {
                    queue.push_back(u);
                }
            }
        }
        seen.len() == members.len()
    }

    fn assert_refines(graph: &Graph, coarse: &Partition, refined: &Partition) {
        assert!(refined.check_covers(graph).is_ok());
        for (_, members) in refined.communities() {
            let Some(&first) = members.iter().next() else {
                panic!("empty refined community");
            };
            let parent = coarse.node_community(first);
            assert!(members.is_subset(parent), "{members:?} leaves {parent:?}");
            assert!(is_connected(graph, members), "{members:?} is disconnected");
        }
    }

    #[test]
    fn test_refined_communities_nest_and_connect() {
        let graph = barbell();
        let coarse = Partition::new(
            &graph,
            [(0..6).map(NodeIndex::new).collect::<Vec<_>>(), (6..12).map(NodeIndex::new).collect()],
        )
        .unwrap();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let refined = refine_partition(
                &graph,
                &coarse,
                &Modularity::new(1.0),
                2.0,
                0.5,
                Weighting::Unit,
                &mut rng,
            );
            assert_refines(&graph, &coarse, &refined);
        }
    }

    #[test]
    fn test_never_merges_across_components() {
        // A-B-C and D-E share the coarse community.
        let graph = Graph::from_edges(5, [(0, 1, 1.0), (1, 2, 1.0), (3, 4, 1.0)]).unwrap();
        let coarse = Partition::trivial(&graph);
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let refined = refine_partition(
                &graph,
                &coarse,
                &Cpm::new(0.1),
                2.0,
                0.0,
                Weighting::Unit,
                &mut rng,
            );
            assert_refines(&graph, &coarse, &refined);
        }
    }

    #[test]
    fn test_large_gamma_keeps_singletons() {
        let graph = barbell();
        let coarse = Partition::trivial(&graph);
        let mut rng = StdRng::seed_from_u64(3);
        let refined = refine_partition(
            &graph,
            &coarse,
            &Modularity::new(1.0),
            2.0,
            3.0,
            Weighting::Unit,
            &mut rng,
        );
        assert_eq!(refined, Partition::singletons(&graph));
    }

    #[test]
    fn test_clique_gets_merged() {
        let mut edges = Vec::new();
        for u in 0..5 {
            for v in u + 1..5 {
                edges.push((u, v, 1.0));
            }
        }
        let graph = Graph::from_edges(5, edges).unwrap();
        let coarse = Partition::trivial(&graph);

        let mut merged_somewhere = false;
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let refined = refine_partition(
                &graph,
                &coarse,
                &Cpm::new(0.25),
                2.0,
                0.25,
                Weighting::Unit,
                &mut rng,
            );
            assert_refines(&graph, &coarse, &refined);
            merged_somewhere |= refined.len() < 5;
        }
        assert!(merged_somewhere);
    }

    #[test]
    fn test_subset_leaves_other_nodes_alone() {
        let graph = barbell();
        let subset: BTreeSet<NodeIndex> = (0..5).map(NodeIndex::new).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let refined = merge_nodes_subset(
            &graph,
            Partition::singletons(&graph),
            &Cpm::new(0.25),
            2.0,
            0.25,
            Weighting::Unit,
            &subset,
            &mut rng,
        );
        for v in (5..12).map(NodeIndex::new) {
            assert_eq!(refined.node_community(v).len(), 1);
        }
        for (_, members) in refined.communities() {
            let inside = members.iter().filter(|v| subset.contains(v)).count();
            assert!(inside == 0 || inside == members.len());
        }
    }

    /// Merge every node of `graph` as one subset, starting from singletons.
    fn merge_all(graph: &Graph, quality: &Cpm, theta: f64, weighting: Weighting, seed: u64) -> Partition {
        let subset: BTreeSet<NodeIndex> = graph.node_indices().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        merge_nodes_subset(
            graph,
            Partition::singletons(graph),
            quality,
            theta,
            0.0,
            weighting,
            &subset,
            &mut rng,
        )
    }

    #[test]
    fn test_losing_moves_are_never_drawn() {
        // 0-1 joined, 2 isolated. Joining 2 costs quality, and a huge θ
        // would otherwise make it about as likely as anything else.
        let graph = Graph::from_edges(3, [(0, 1, 1.0)]).unwrap();
        let edgeless = Graph::from_edges(3, []).unwrap();
        for seed in 0..20 {
            let refined = merge_all(&graph, &Cpm::new(0.5), 1e6, Weighting::Unit, seed);
            assert_eq!(refined.node_community(NodeIndex::new(2)).len(), 1, "seed {seed}");

            let refined = merge_all(&edgeless, &Cpm::new(0.5), 1e6, Weighting::Unit, seed);
            assert_eq!(refined, Partition::singletons(&edgeless), "seed {seed}");
        }
    }

    #[test]
    fn test_small_theta_picks_the_best_target() {
        // Joining 1 gains 4.5 for node 0, joining 2 only 0.5.
        let graph = Graph::from_edges(3, [(0, 1, 5.0), (0, 2, 1.0)]).unwrap();
        for seed in 0..20 {
            let refined = merge_all(&graph, &Cpm::new(0.5), 1e-3, Weighting::Weighted, seed);
            assert_eq!(
                refined.community_of(NodeIndex::new(0)),
                refined.community_of(NodeIndex::new(1)),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn test_staying_alone_is_a_choice() {
        // Merging the pair gains 0.25, staying gains 0; with θ = 10 both
        // are drawn with roughly even odds.
        let graph = Graph::from_edges(2, [(0, 1, 1.0)]).unwrap();
        let outcomes: BTreeSet<usize> = (0..100)
            .map(|seed| merge_all(&graph, &Cpm::new(0.75), 10.0, Weighting::Unit, seed).len())
            .collect();
        assert_eq!(outcomes, BTreeSet::from([1, 2]));
    }
}
