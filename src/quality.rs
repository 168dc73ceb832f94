//! Quality functions over (graph, partition) pairs.
//!
//! ## Modularity
//!
//! Compares the weight inside communities with what a configuration null
//! model predicts:
//!
//! ```text
//! H = (1/2m) × Σ_C [ 2·e(C) − (γ/2m)·K(C)² ]
//! ```
//!
//! where e(C) is the edge weight inside C and K(C) the degree sum of C.
//! Undefined (NaN) when the graph has no edges.
//!
//! ## Constant Potts Model
//!
//! ```text
//! H = Σ_C [ e(C) − γ·n(C)·(n(C) − 1)/2 ]
//! ```
//!
//! where n(C) counts original vertices, so aggregated nodes weigh as much as
//! the vertices they stand for. CPM has no resolution limit: γ acts as a
//! density threshold between and within communities.
//!
//! ## Incremental deltas
//!
//! Moving one node v from A to B only changes the A and B summands. With
//! k = deg(v), s = n(v) and E(v, X) the weight between v and X∖{v}:
//!
//! ```text
//! ΔModularity = [ 2·(E(v,B) − E(v,A)) − (γ/2m)·2k·(K(B) − K(A) + k) ] / 2m
//! ΔCPM        = E(v,B) − E(v,A) − γ·s·(n(B) − n(A) + s)
//! ```
//!
//! Self-loops of v move with it and cancel out. Both deltas only touch v's
//! incident edges and the cached community sizes and volumes.

use crate::graph::{Graph, Weighting};
use crate::partition::{CommunityId, Partition, Target};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// A function measuring how good a partition of a graph is. Higher is better.
///
/// `score` and `delta` read community sizes and volumes cached from the
/// graph the partition was built for, so `partition` must be a partition of
/// `graph` or of one of its clones. [`Partition::check_covers`] tells the
/// two apart; debug builds assert it.
pub trait QualityMetric: Send + Sync {
    /// The resolution parameter γ.
    fn resolution(&self) -> f64;

    /// Quality of `partition` on `graph`.
    fn score(&self, graph: &Graph, partition: &Partition, weighting: Weighting) -> f64;

    /// Exact change in [`score`](Self::score) from moving `v` into `target`.
    ///
    /// Equals `score(partition.move_node(v, target)) - score(partition)`
    /// up to rounding.
    fn delta(
        &self,
        graph: &Graph,
        partition: &Partition,
        v: NodeIndex,
        target: Target,
        weighting: Weighting,
    ) -> f64;
}

/// Modularity with resolution γ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modularity {
    resolution: f64,
}

impl Modularity {
    /// Modularity with the given resolution.
    pub fn new(resolution: f64) -> Self {
        Self { resolution }
    }
}

impl Default for Modularity {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl QualityMetric for Modularity {
    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn score(&self, graph: &Graph, partition: &Partition, weighting: Weighting) -> f64 {
        debug_assert!(partition.check_covers(graph).is_ok());
        let two_m = 2.0 * graph.total_weight(weighting);
        if two_m == 0.0 {
            return f64::NAN;
        }
        let norm = self.resolution / two_m;
        let internal = internal_weights(graph, partition, weighting);

        let sum: f64 = partition
            .ids()
            .map(|id| {
                let e = internal.get(&id).copied().unwrap_or(0.0);
                let volume = partition.volume(id, weighting);
                2.0 * e - norm * volume.powi(2)
            })
            .sum();
        sum / two_m
    }

    fn delta(
        &self,
        graph: &Graph,
        partition: &Partition,
        v: NodeIndex,
        target: Target,
        weighting: Weighting,
    ) -> f64 {
        debug_assert!(partition.check_covers(graph).is_ok());
        let two_m = 2.0 * graph.total_weight(weighting);
        if two_m == 0.0 {
            return f64::NAN;
        }
        let current = partition.community_of(v);
        let target = partition.resolve(target);
        if target == Some(current) {
            return 0.0;
        }

        let k = graph.weighted_degree(v, weighting);
        let from_volume = partition.volume(current, weighting);
        let to_volume = target.map_or(0.0, |id| partition.volume(id, weighting));
        let gained = weight_to(graph, partition, v, target, weighting);
        let lost = weight_to(graph, partition, v, Some(current), weighting);

        let norm = self.resolution / two_m;
        (2.0 * (gained - lost) - norm * 2.0 * k * (to_volume - from_volume + k)) / two_m
    }
}

/// Constant Potts Model with resolution γ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cpm {
    resolution: f64,
}

impl Cpm {
    /// CPM with the given resolution.
    pub fn new(resolution: f64) -> Self {
        Self { resolution }
    }
}

impl Default for Cpm {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl QualityMetric for Cpm {
    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn score(&self, graph: &Graph, partition: &Partition, weighting: Weighting) -> f64 {
        debug_assert!(partition.check_covers(graph).is_ok());
        let internal = internal_weights(graph, partition, weighting);
        partition
            .ids()
            .map(|id| {
                let e = internal.get(&id).copied().unwrap_or(0.0);
                let n = partition.size(id) as f64;
                e - self.resolution * (n * (n - 1.0) / 2.0)
            })
            .sum()
    }

    fn delta(
        &self,
        graph: &Graph,
        partition: &Partition,
        v: NodeIndex,
        target: Target,
        weighting: Weighting,
    ) -> f64 {
        debug_assert!(partition.check_covers(graph).is_ok());
        let current = partition.community_of(v);
        let target = partition.resolve(target);
        if target == Some(current) {
            return 0.0;
        }

        let s = graph.node_size(v) as f64;
        let from_size = partition.size(current) as f64;
        let to_size = target.map_or(0.0, |id| partition.size(id) as f64);
        let gained = weight_to(graph, partition, v, target, weighting);
        let lost = weight_to(graph, partition, v, Some(current), weighting);

        gained - lost - self.resolution * s * (to_size - from_size + s)
    }
}

/// Weight between `v` and the other members of `community`.
///
/// `None` stands for a fresh community and always gives 0.
pub(crate) fn weight_to(
    graph: &Graph,
    partition: &Partition,
    v: NodeIndex,
    community: Option<CommunityId>,
    weighting: Weighting,
) -> f64 {
    let Some(community) = community else {
        return 0.0;
    };
    graph
        .incident_edges(v)
        .filter(|&(u, _)| u != v && partition.community_of(u) == community)
        .map(|(_, edge)| weighting.of(edge))
        .sum()
}

/// Edge weight inside each community, self-loops included.
fn internal_weights(
    graph: &Graph,
    partition: &Partition,
    weighting: Weighting,
) -> HashMap<CommunityId, f64> {
    let mut internal = HashMap::new();
    for (u, v, edge) in graph.edges() {
        let c = partition.community_of(u);
        if c == partition.community_of(v) {
            *internal.entry(c).or_insert(0.0) += weighting.of(edge);
        }
    }
    internal
}
